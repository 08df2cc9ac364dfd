#![allow(dead_code)]
//! Test harness utilities for guise-core integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use guise_core::audio::{
    CompletionSender, LiveSound, LoadCompletion, LoadTicket, PlayOptions, SoundEngine,
};
use guise_core::config::Config;
use guise_core::error::ResolveError;
use guise_core::resolver::{
    BrowseOptions, DirectoryListing, IndirectLookup, Listing, LookupEntry, ResourceResolver,
    SourceKind,
};
use guise_core::session::{EditorSession, SessionEvent};
use guise_types::AppearanceProfile;

/// Observable state of one fake sound.
#[derive(Debug, Default)]
pub struct SoundState {
    pub stopped: bool,
    pub volume: f32,
    pub looping: bool,
}

pub type SharedSound = Arc<Mutex<SoundState>>;

struct FakeSound(SharedSound);

impl LiveSound for FakeSound {
    fn stop(&mut self) {
        self.0.lock().unwrap().stopped = true;
    }
    fn volume(&self) -> f32 {
        self.0.lock().unwrap().volume
    }
    fn set_volume(&mut self, volume: f32) {
        self.0.lock().unwrap().volume = volume;
    }
    fn looping(&self) -> bool {
        self.0.lock().unwrap().looping
    }
    fn set_looping(&mut self, looping: bool) {
        self.0.lock().unwrap().looping = looping;
    }
}

struct PendingLoad {
    locator: String,
    options: PlayOptions,
    ticket: LoadTicket,
    done: CompletionSender,
}

/// Sound engine whose loads complete only when the test says so.
#[derive(Clone, Default)]
pub struct ManualEngine {
    loads: Arc<Mutex<Vec<PendingLoad>>>,
    finished: Arc<Mutex<usize>>,
}

impl SoundEngine for ManualEngine {
    fn play(&self, locator: &str, options: PlayOptions, ticket: LoadTicket, done: CompletionSender) {
        self.loads.lock().unwrap().push(PendingLoad {
            locator: locator.to_string(),
            options,
            ticket,
            done,
        });
    }
}

impl ManualEngine {
    pub fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }

    pub fn locator(&self, index: usize) -> String {
        self.loads.lock().unwrap()[index].locator.clone()
    }

    pub fn options(&self, index: usize) -> PlayOptions {
        self.loads.lock().unwrap()[index].options
    }

    /// Complete load `index` with a playing sound and return its state.
    pub fn finish(&self, index: usize) -> SharedSound {
        let loads = self.loads.lock().unwrap();
        let load = &loads[index];
        let sound = Arc::new(Mutex::new(SoundState {
            stopped: false,
            volume: load.options.volume,
            looping: load.options.looping,
        }));
        load.done
            .send(LoadCompletion {
                ticket: load.ticket,
                result: Ok(Box::new(FakeSound(sound.clone()))),
            })
            .unwrap();
        sound
    }

    /// Complete every load started since the last call.
    pub fn finish_outstanding(&self) -> Vec<SharedSound> {
        let total = self.load_count();
        let start = std::mem::replace(&mut *self.finished.lock().unwrap(), total);
        (start..total).map(|index| self.finish(index)).collect()
    }
}

/// Listing backed by a fixed directory → files table.
#[derive(Default)]
pub struct MapListing {
    dirs: HashMap<String, Vec<String>>,
}

impl MapListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, dir: &str, files: &[&str]) -> Self {
        self.dirs
            .insert(dir.to_string(), files.iter().map(|f| f.to_string()).collect());
        self
    }
}

impl DirectoryListing for MapListing {
    fn browse(&self, _: SourceKind, dir: &str, _: &BrowseOptions) -> Result<Listing, ResolveError> {
        self.dirs
            .get(dir)
            .map(|files| Listing {
                files: files.clone(),
            })
            .ok_or_else(|| ResolveError::listing(dir, "no such directory"))
    }
}

/// Listing that fails until switched online.
pub struct FlakyListing {
    online: Arc<AtomicBool>,
    inner: MapListing,
}

impl FlakyListing {
    pub fn new(inner: MapListing) -> (Self, Arc<AtomicBool>) {
        let online = Arc::new(AtomicBool::new(false));
        (
            Self {
                online: online.clone(),
                inner,
            },
            online,
        )
    }
}

impl DirectoryListing for FlakyListing {
    fn browse(&self, source: SourceKind, dir: &str, options: &BrowseOptions) -> Result<Listing, ResolveError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(ResolveError::listing(dir, "storage offline"));
        }
        self.inner.browse(source, dir, options)
    }
}

/// Lookup table of key → record.
#[derive(Default)]
pub struct MapLookup {
    records: HashMap<String, String>,
}

impl MapLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, key: &str, locator: &str) -> Self {
        self.records.insert(key.to_string(), locator.to_string());
        self
    }
}

impl IndirectLookup for MapLookup {
    fn get_entry(&self, key: &str) -> Option<LookupEntry> {
        self.records.get(key).cloned().map(LookupEntry::Record)
    }

    fn children_under(&self, _: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Open a session with default config over `listing`, returning the engine
/// so the test can complete loads.
pub fn open(profile: AppearanceProfile, listing: MapListing) -> (EditorSession, ManualEngine) {
    open_with(profile, ResourceResolver::with_seed(Box::new(listing), 42))
}

pub fn open_with(profile: AppearanceProfile, resolver: ResourceResolver) -> (EditorSession, ManualEngine) {
    let engine = ManualEngine::default();
    let session = EditorSession::new(profile, resolver, Box::new(engine.clone()), &Config::default());
    (session, engine)
}

/// Drain every event currently queued on `rx`.
pub fn drain(rx: &crossbeam_channel::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    rx.try_iter().collect()
}
