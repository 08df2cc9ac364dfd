use crossbeam_channel::Sender;

use guise_types::LayerId;

/// One playing sound instance owned by the engine.
pub trait LiveSound: Send {
    fn stop(&mut self);
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn looping(&self) -> bool;
    fn set_looping(&mut self, looping: bool);
}

/// Correlates a load request with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    pub volume: f32,
    pub looping: bool,
}

pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub result: Result<Box<dyn LiveSound>, String>,
}

impl std::fmt::Debug for LoadCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadCompletion")
            .field("ticket", &self.ticket)
            .field("ok", &self.result.is_ok())
            .finish()
    }
}

pub type CompletionSender = Sender<LoadCompletion>;

/// Sound playback capability.
///
/// `play` must not block on the load. The engine sends exactly one
/// [`LoadCompletion`] for `ticket` on `done` once the sound is playing or
/// has failed; it may do so before `play` returns. A load cannot be
/// interrupted once started. If that send fails the session is gone, and
/// the engine must stop the sound itself.
pub trait SoundEngine {
    fn play(&self, locator: &str, options: PlayOptions, ticket: LoadTicket, done: CompletionSender);
}

/// A live sound tagged with what it was created from.
pub struct SoundHandle {
    layer: LayerId,
    source_ref: String,
    locator: String,
    sound: Box<dyn LiveSound>,
}

impl SoundHandle {
    pub(super) fn new(
        layer: LayerId,
        source_ref: String,
        locator: String,
        sound: Box<dyn LiveSound>,
    ) -> Self {
        Self {
            layer,
            source_ref,
            locator,
            sound,
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Reference string of the layer when the sound was started.
    pub fn source_ref(&self) -> &str {
        &self.source_ref
    }

    /// Concrete locator the sound was loaded from.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn volume(&self) -> f32 {
        self.sound.volume()
    }

    pub fn looping(&self) -> bool {
        self.sound.looping()
    }

    /// Push volume and loop settings; returns true if anything changed.
    pub(super) fn sync(&mut self, volume: f32, looping: bool) -> bool {
        let mut changed = false;
        if (self.sound.volume() - volume).abs() > f32::EPSILON {
            self.sound.set_volume(volume);
            changed = true;
        }
        if self.sound.looping() != looping {
            self.sound.set_looping(looping);
            changed = true;
        }
        changed
    }

    pub(super) fn stop(mut self) {
        self.sound.stop();
    }
}

impl std::fmt::Debug for SoundHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundHandle")
            .field("layer", &self.layer)
            .field("source_ref", &self.source_ref)
            .field("locator", &self.locator)
            .finish()
    }
}
