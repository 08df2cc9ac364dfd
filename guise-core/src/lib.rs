//! # guise-core
//!
//! Backend library for the guise appearance-profile editor. Provides resource
//! resolution, preview derivation, sound lifecycle and the editing session,
//! independent of any UI framework.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use guise_core::config::Config;
//! use guise_core::resolver::{FsDirectoryListing, ResourceResolver};
//! use guise_core::session::EditorSession;
//! use guise_types::{AppearanceProfile, EditorCommand, LayerKind};
//!
//! // 1. Load config (embedded defaults merged with the user file)
//! let config = Config::load();
//!
//! // 2. Build a resolver over the content root
//! let resolver = ResourceResolver::new(Box::new(FsDirectoryListing::new("data")))
//!     .with_max_depth(config.max_lookup_depth());
//!
//! // 3. Open a session with a sound engine
//! let mut session = EditorSession::new(AppearanceProfile::new("Wolf"), resolver, engine, &config);
//! let (_id, events) = session.subscribe();
//!
//! // 4. Apply commands; call tick() and poll_audio() from the event loop
//! session.apply(EditorCommand::AddLayer(LayerKind::Audio));
//! session.tick(std::time::Instant::now());
//! session.poll_audio();
//!
//! // 5. Save and close
//! session.save(&mut store)?;
//! session.close();
//! ```
//!
//! ## Module Overview
//!
//! - [`resolver`]: resource reference resolution: literal paths, wildcard
//!   picks and depth-bounded indirect lookup
//! - [`compositor`]: pure profile → [`compositor::RenderDescriptor`] derivation
//! - [`audio`]: reconciliation of live sounds against the layer list
//! - [`snapshot`]: edit buffer, field extraction and snapshot/restore
//! - [`session`]: command dispatch, debounce, observers, save
//! - [`store`]: profile persistence
//! - [`config`]: TOML configuration
//! - [`error`]: error types

pub mod audio;
pub mod compositor;
pub mod config;
pub mod debounce;
pub mod error;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod store;

pub use guise_types as types;
