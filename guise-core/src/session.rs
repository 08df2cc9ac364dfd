//! One open editing session over a profile.
//!
//! [`EditorSession::apply`] is the single entry point for editor commands.
//! Structural commands go through the pure reducers with the in-flight edits
//! snapshotted around them; field edits land in the edit buffer and refresh
//! the preview after their control's debounce window.

use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use guise_types::reduce::reduce_command;
use guise_types::{
    AppearanceProfile, ControlKind, EditorCommand, InspectorTarget, LayerId, LayerKind, LayerPatch,
    LayerStore, ProfileId,
};

use crate::audio::{AudioLifecycleManager, SoundEngine};
use crate::compositor::{compose, PreviewContext, PreviewInput, RenderDescriptor, ResolvedRefs};
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::SaveError;
use crate::resolver::ResourceResolver;
use crate::snapshot::{extract, EditBuffer, Snapshot};
use crate::store::{validate_for_save, ProfileStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Notifications delivered to session observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PreviewUpdated(RenderDescriptor),
    /// The editing surface must be rebuilt for the given inspector target.
    Rebuilt(InspectorTarget),
    Saved(ProfileId),
}

/// What one command did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub changed: bool,
    pub rebuilt: bool,
    /// Preview recomputed during this call.
    pub refreshed: bool,
    /// Preview waits for the debounce window; see [`EditorSession::tick`].
    pub deferred: bool,
    pub added: Option<LayerId>,
}

pub struct EditorSession {
    baseline: AppearanceProfile,
    edits: EditBuffer,
    resolver: ResourceResolver,
    audio: AudioLifecycleManager,
    resolved: ResolvedRefs,
    debounce: Debouncer,
    context: PreviewContext,
    visual_defaults: LayerPatch,
    audio_defaults: LayerPatch,
    target: InspectorTarget,
    preview: Option<RenderDescriptor>,
    audio_dirty: bool,
    subscribers: Vec<(SubscriptionId, Sender<SessionEvent>)>,
    next_subscription: u64,
    closed: bool,
}

impl EditorSession {
    /// Open a session. Computes the first preview and starts the profile's
    /// sounds.
    pub fn new(
        profile: AppearanceProfile,
        resolver: ResourceResolver,
        engine: Box<dyn SoundEngine>,
        config: &Config,
    ) -> Self {
        let mut session = Self {
            baseline: profile,
            edits: EditBuffer::new(),
            resolver,
            audio: AudioLifecycleManager::new(engine),
            resolved: ResolvedRefs::new(),
            debounce: Debouncer::from_config(config),
            context: PreviewContext {
                grid_distance: config.grid_distance(),
            },
            visual_defaults: config.layer_defaults(LayerKind::Visual),
            audio_defaults: config.layer_defaults(LayerKind::Audio),
            target: InspectorTarget::default(),
            preview: None,
            audio_dirty: true,
            subscribers: Vec::new(),
            next_subscription: 0,
            closed: false,
        };
        log::debug!(target: "session", "opened profile {:?}", session.baseline.label);
        session.refresh();
        session
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self) -> (SubscriptionId, Receiver<SessionEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        if !self.closed {
            self.subscribers.push((id, tx));
        }
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn emit(&mut self, event: SessionEvent) {
        // Receivers that were dropped fall out here.
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn apply(&mut self, command: EditorCommand) -> ApplyOutcome {
        self.apply_at(command, Instant::now())
    }

    /// [`Self::apply`] with an explicit clock, for debounce timing.
    pub fn apply_at(&mut self, command: EditorCommand, now: Instant) -> ApplyOutcome {
        if self.closed {
            log::warn!(target: "session", "command on closed session ignored: {:?}", command);
            return ApplyOutcome::default();
        }
        match command {
            EditorCommand::EditField {
                key,
                value,
                control,
            } => {
                self.edits.set(key, value);
                self.audio_dirty |= key.layer().is_some();
                self.after_edit(control, now)
            }
            EditorCommand::SetFieldActive { key, active } => {
                if !self.edits.set_active(key, active, &self.baseline) {
                    return ApplyOutcome::default();
                }
                self.audio_dirty |= key.layer().is_some();
                self.after_edit(ControlKind::Discrete, now)
            }
            command => self.apply_structural(&command),
        }
    }

    fn after_edit(&mut self, control: ControlKind, now: Instant) -> ApplyOutcome {
        let immediate = self.debounce.schedule(control, now);
        if immediate {
            self.refresh();
        }
        ApplyOutcome {
            changed: true,
            refreshed: immediate,
            deferred: !immediate,
            ..Default::default()
        }
    }

    fn apply_structural(&mut self, command: &EditorCommand) -> ApplyOutcome {
        let snapshot = Snapshot::capture(&self.baseline, &self.edits);
        let mut reloaded = self.baseline.clone();
        let Some(reduced) = reduce_command(command, &mut reloaded) else {
            return ApplyOutcome::default();
        };
        let select = match command {
            EditorCommand::SelectTarget(target) => Some(*target),
            _ => None,
        };
        if !reduced.changed && select.is_none() {
            log::debug!(target: "session", "no-op command {:?}", command);
            return ApplyOutcome::default();
        }

        if let Some(id) = reduced.added {
            let defaults = match reloaded.effects.get(id).map(|l| l.kind) {
                Some(LayerKind::Audio) => &self.audio_defaults,
                _ => &self.visual_defaults,
            };
            reloaded.effects.mutate(id, defaults);
        }

        self.baseline = snapshot.restore(&reloaded);
        self.edits.clear();
        self.debounce.cancel();

        if let Some(target) = select {
            self.target = target;
        } else if let Some(id) = reduced.added {
            self.target = InspectorTarget::Layer(id);
        }
        if let InspectorTarget::Layer(id) = self.target {
            if !self.baseline.effects.contains(id) {
                self.target = InspectorTarget::Base;
            }
        }

        self.audio_dirty |= command.touches_audio();
        self.emit(SessionEvent::Rebuilt(self.target));
        self.refresh();
        ApplyOutcome {
            changed: true,
            rebuilt: true,
            refreshed: true,
            deferred: false,
            added: reduced.added,
        }
    }

    /// Recompute the preview once a pending debounce window has passed.
    /// Returns true when it did.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.closed || !self.debounce.due(now) {
            return false;
        }
        self.refresh();
        true
    }

    /// Settle finished sound loads. Returns how many sounds became live.
    /// After close every late load is stopped as it lands.
    pub fn poll_audio(&mut self) -> usize {
        if self.closed {
            return self.audio.drain_completions(&LayerStore::new());
        }
        let profile = self.profile();
        self.audio.drain_completions(&profile.effects)
    }

    fn refresh(&mut self) {
        let profile = self.profile();
        if self.resolved.refresh(&profile, &mut self.resolver) {
            self.audio_dirty = true;
        }
        let descriptor = compose(&PreviewInput {
            profile: &profile,
            resolved: &self.resolved,
            context: self.context,
        });
        if self.audio_dirty {
            self.audio_dirty = false;
            let report = self.audio.reconcile(&profile.effects, &mut self.resolved);
            if !report.is_noop() {
                log::debug!(target: "session", "audio reconciled: {:?}", report);
            }
        }
        self.preview = Some(descriptor.clone());
        self.emit(SessionEvent::PreviewUpdated(descriptor));
    }

    // ------------------------------------------------------------------
    // Save / close
    // ------------------------------------------------------------------

    /// Validate and persist the current profile. On success the session
    /// adopts the stored id and the edits become the new baseline.
    pub fn save(&mut self, store: &mut dyn ProfileStore) -> Result<ProfileId, SaveError> {
        let mut profile = self.profile();
        validate_for_save(&profile)?;
        let id = store.save(&profile).map_err(|e| {
            log::warn!(target: "session", "save failed: {}", e);
            SaveError::from(e)
        })?;
        profile.id = Some(id.clone());
        self.baseline = profile;
        self.edits.clear();
        log::info!(target: "session", "saved profile {}", id);
        self.emit(SessionEvent::Saved(id.clone()));
        Ok(id)
    }

    /// Stop every sound and drop every observer. Further commands are ignored.
    ///
    /// Loads still in flight are stopped by [`Self::poll_audio`] when they
    /// land, or by the engine itself once the session is dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.audio.stop_all();
        self.audio.drain_completions(&LayerStore::new());
        self.subscribers.clear();
        self.debounce.cancel();
        log::debug!(target: "session", "closed profile {:?}", self.baseline.label);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The profile as currently edited.
    pub fn profile(&self) -> AppearanceProfile {
        extract(&self.baseline, &self.edits)
    }

    pub fn baseline(&self) -> &AppearanceProfile {
        &self.baseline
    }

    pub fn edits(&self) -> &EditBuffer {
        &self.edits
    }

    pub fn target(&self) -> InspectorTarget {
        self.target
    }

    /// Last computed preview.
    pub fn preview(&self) -> Option<&RenderDescriptor> {
        self.preview.as_ref()
    }

    pub fn audio(&self) -> &AudioLifecycleManager {
        &self.audio
    }

    pub fn has_pending_preview(&self) -> bool {
        self.debounce.is_pending()
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.close();
        self.poll_audio();
    }
}
