//! Render a saved profile's preview description as JSON.
//!
//! Resource references resolve against the directory holding the profile.

use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use guise_core::compositor::{compose, PreviewContext, PreviewInput, RenderDescriptor, ResolvedRefs};
use guise_core::config::Config;
use guise_core::resolver::{FsDirectoryListing, ResourceResolver};
use guise_core::store::validate_for_save;
use guise_types::AppearanceProfile;

const USAGE: &str = "usage: guise-preview [--verbose] [--check] <profile.json>";

fn init_logging(verbose: bool) {
    use simplelog::{LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guise")
        .join("guise.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create("/tmp/guise.log")) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("guise-preview: no log file ({}), logging disabled", e);
            return;
        }
    };

    if WriteLogger::init(log_level, simplelog::Config::default(), log_file).is_err() {
        eprintln!("guise-preview: logger already initialized");
        return;
    }

    log::info!("guise-preview starting (log level: {:?})", log_level);
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let check = args.iter().any(|a| a == "--check");
    init_logging(verbose);

    // CLI argument: profile path (skip flags)
    let Some(path) = args.iter().skip(1).find(|a| !a.starts_with('-')) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    match run(Path::new(path), check) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}: {}", path, e);
            eprintln!("guise-preview: {}: {}", path, e);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path, check: bool) -> Result<String, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)?;
    let profile: AppearanceProfile = serde_json::from_str(&contents)?;
    if check {
        validate_for_save(&profile)?;
    }
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let descriptor = render(&profile, root, &Config::load());
    Ok(serde_json::to_string_pretty(&descriptor)?)
}

fn render(profile: &AppearanceProfile, root: &Path, config: &Config) -> RenderDescriptor {
    let listing = FsDirectoryListing::new(root);
    let mut resolver =
        ResourceResolver::new(Box::new(listing)).with_max_depth(config.max_lookup_depth());
    let mut resolved = ResolvedRefs::new();
    resolved.refresh(profile, &mut resolver);
    compose(&PreviewInput {
        profile,
        resolved: &resolved,
        context: PreviewContext {
            grid_distance: config.grid_distance(),
        },
    })
}
