//! Resource reference resolution.
//!
//! A reference is one of:
//! - a literal path, returned percent-decoded,
//! - a wildcard path (`*`, `?` in the file name), matched against a
//!   directory listing with one match picked at random,
//! - an indirect lookup key (no path separator) resolved through an external
//!   table, recursing into random children when an entry is not a record.
//!
//! Every failure degrades to `None`; an unresolved cosmetic reference shows
//! nothing instead of failing the edit.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::{Regex, RegexBuilder};

use crate::error::ResolveError;

/// Recursion bound for indirect lookups. Policy constant, overridable via
/// `[resolver] max_lookup_depth`.
pub const MAX_LOOKUP_DEPTH: usize = 10;

/// Storage a directory listing reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// User data directory.
    #[default]
    Data,
    /// Read-only assets shipped with the host application.
    Public,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseOptions {
    /// Caller intends to filter the result with a wildcard pattern.
    pub wildcard: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// File names or paths, possibly percent-encoded.
    pub files: Vec<String>,
}

/// Directory listing capability.
pub trait DirectoryListing {
    fn browse(
        &self,
        source: SourceKind,
        dir: &str,
        options: &BrowseOptions,
    ) -> Result<Listing, ResolveError>;
}

/// One entry of the indirect lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupEntry {
    /// A concrete resource locator.
    Record(String),
    /// Several interchangeable locators.
    List(Vec<String>),
    /// A grouping node; resolve through its children.
    Empty,
}

/// Indirect lookup table capability.
pub trait IndirectLookup {
    fn get_entry(&self, key: &str) -> Option<LookupEntry>;
    fn children_under(&self, key: &str) -> Vec<String>;
}

/// Lists files of a directory tree on the local filesystem.
pub struct FsDirectoryListing {
    root: PathBuf,
}

impl FsDirectoryListing {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DirectoryListing for FsDirectoryListing {
    fn browse(
        &self,
        _source: SourceKind,
        dir: &str,
        _options: &BrowseOptions,
    ) -> Result<Listing, ResolveError> {
        let path = self.root.join(dir.trim_start_matches('/'));
        let entries =
            std::fs::read_dir(&path).map_err(|e| ResolveError::listing(dir, e.to_string()))?;
        let mut files: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        Ok(Listing { files })
    }
}

/// Anything that maps a reference to its current concrete locator.
pub trait Locate {
    fn locate(&mut self, reference: &str) -> Option<String>;
}

pub struct ResourceResolver {
    listing: Box<dyn DirectoryListing>,
    lookup: Option<Box<dyn IndirectLookup>>,
    source: SourceKind,
    max_depth: usize,
    rng: StdRng,
}

impl ResourceResolver {
    pub fn new(listing: Box<dyn DirectoryListing>) -> Self {
        Self {
            listing,
            lookup: None,
            source: SourceKind::Data,
            max_depth: MAX_LOOKUP_DEPTH,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic random picks, for tests and reproducible previews.
    pub fn with_seed(listing: Box<dyn DirectoryListing>, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(listing)
        }
    }

    pub fn with_lookup(mut self, lookup: Box<dyn IndirectLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve a reference to at most one concrete locator.
    pub fn resolve(&mut self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if has_wildcard(reference) {
            return self.resolve_wildcard(reference);
        }
        if let Some(lookup) = self.lookup.as_deref() {
            if is_key_shaped(reference) && knows_key(lookup, reference) {
                return resolve_key(lookup, &mut self.rng, reference, 0, self.max_depth);
            }
        }
        Some(percent_decode(reference))
    }

    fn resolve_wildcard(&mut self, reference: &str) -> Option<String> {
        let decoded = percent_decode(reference);
        let (dir, pattern) = match decoded.rfind('/') {
            Some(idx) => (&decoded[..idx], &decoded[idx + 1..]),
            None => ("", decoded.as_str()),
        };
        if has_wildcard(dir) {
            log::warn!(target: "resolver", "wildcards in directory names are not supported: {}", reference);
            return None;
        }
        let regex = match compile_pattern(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                log::warn!(target: "resolver", "{}", e);
                return None;
            }
        };
        let options = BrowseOptions { wildcard: true };
        let listing = match self.listing.browse(self.source, dir, &options) {
            Ok(listing) => listing,
            Err(e) => {
                log::warn!(target: "resolver", "wildcard {} unresolved: {}", reference, e);
                return None;
            }
        };

        let matches: Vec<String> = listing
            .files
            .iter()
            .map(|f| percent_decode(f))
            .filter(|f| regex.is_match(file_name(f)))
            .map(|f| {
                if f.contains('/') || dir.is_empty() {
                    f
                } else {
                    format!("{}/{}", dir, f)
                }
            })
            .collect();

        if matches.is_empty() {
            log::debug!(target: "resolver", "no file matches {}", reference);
            return None;
        }
        let pick = self.rng.random_range(0..matches.len());
        matches.into_iter().nth(pick)
    }
}

impl Locate for ResourceResolver {
    fn locate(&mut self, reference: &str) -> Option<String> {
        self.resolve(reference)
    }
}

fn resolve_key(
    lookup: &dyn IndirectLookup,
    rng: &mut StdRng,
    key: &str,
    depth: usize,
    max_depth: usize,
) -> Option<String> {
    if depth >= max_depth {
        log::warn!(target: "resolver", "lookup of {} exceeded depth {}", key, max_depth);
        return None;
    }
    match lookup.get_entry(key) {
        Some(LookupEntry::Record(locator)) => Some(locator).filter(|l| !l.is_empty()),
        Some(LookupEntry::List(entries)) => {
            if entries.is_empty() {
                return None;
            }
            let pick = rng.random_range(0..entries.len());
            entries.into_iter().nth(pick).filter(|l| !l.is_empty())
        }
        Some(LookupEntry::Empty) | None => {
            let children = lookup.children_under(key);
            if children.is_empty() {
                log::debug!(target: "resolver", "lookup key {} has no children", key);
                return None;
            }
            let pick = rng.random_range(0..children.len());
            resolve_key(lookup, rng, &children[pick], depth + 1, max_depth)
        }
    }
}

fn knows_key(lookup: &dyn IndirectLookup, key: &str) -> bool {
    lookup.get_entry(key).is_some() || !lookup.children_under(key).is_empty()
}

fn is_key_shaped(reference: &str) -> bool {
    !reference.contains('/') && !reference.contains('\\')
}

pub fn has_wildcard(reference: &str) -> bool {
    reference.contains('*') || reference.contains('?')
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Compile a file-name wildcard into an anchored, case-insensitive regex.
pub fn compile_pattern(pattern: &str) -> Result<Regex, ResolveError> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for c in pattern.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|e| ResolveError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Decode `%XX` escapes. Malformed escapes are kept as written; a result
/// that is not UTF-8 leaves the input unchanged.
pub fn percent_decode(input: &str) -> String {
    if !input.contains('%') {
        return input.to_string();
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}
