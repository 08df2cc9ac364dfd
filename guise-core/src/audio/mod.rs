//! Playback of a profile's audio layers.
//!
//! The sound engine is an external capability: [`SoundEngine::play`] starts
//! an asynchronous load and reports the result on a channel owned by
//! [`AudioLifecycleManager`], which is the only owner of live sound handles.

mod engine;
mod lifecycle;

pub use engine::{
    CompletionSender, LiveSound, LoadCompletion, LoadTicket, PlayOptions, SoundEngine, SoundHandle,
};
pub use lifecycle::{AudioLifecycleManager, ReconcileReport};
