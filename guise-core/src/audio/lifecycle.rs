//! Reconciliation of desired audio layers against live sound handles.
//!
//! A pass runs after every structural change. Loads are asynchronous and
//! cannot be cancelled; a load whose layer stopped being wanted while it
//! was in flight is stopped as soon as it lands and is never exposed live.

use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender};

use guise_types::{EffectLayer, LayerId, LayerStore};

use super::engine::{LoadCompletion, LoadTicket, PlayOptions, SoundEngine, SoundHandle};
use crate::resolver::{has_wildcard, Locate};

enum AudioSlot {
    Pending {
        ticket: LoadTicket,
        source_ref: String,
    },
    Live(SoundHandle),
}

/// Bookkeeping for a load in flight, kept even after its slot is discarded.
struct InFlight {
    layer: LayerId,
    source_ref: String,
    locator: String,
}

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub started: usize,
    pub stopped: usize,
    pub updated: usize,
    pub unresolved: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        *self == ReconcileReport::default()
    }
}

pub struct AudioLifecycleManager {
    engine: Box<dyn SoundEngine>,
    slots: HashMap<LayerId, AudioSlot>,
    in_flight: HashMap<LoadTicket, InFlight>,
    next_ticket: u64,
    completion_tx: Sender<LoadCompletion>,
    completion_rx: Receiver<LoadCompletion>,
}

fn is_desired(layer: &EffectLayer) -> bool {
    layer.is_audio() && layer.is_active()
}

fn play_options(layer: &EffectLayer) -> PlayOptions {
    PlayOptions {
        volume: layer.volume(),
        looping: layer.looping,
    }
}

impl AudioLifecycleManager {
    pub fn new(engine: Box<dyn SoundEngine>) -> Self {
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();
        Self {
            engine,
            slots: HashMap::new(),
            in_flight: HashMap::new(),
            next_ticket: 0,
            completion_tx,
            completion_rx,
        }
    }

    /// Align live and pending sounds with the enabled audio layers of `layers`.
    ///
    /// A live sound is kept while its layer's reference is unchanged and, for
    /// references without wildcards, while `locator` still maps it to the
    /// locator that is playing.
    pub fn reconcile(&mut self, layers: &LayerStore, locator: &mut dyn Locate) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        // Drop entries whose layer is gone, disabled or pathless.
        let stale: Vec<LayerId> = self
            .slots
            .keys()
            .copied()
            .filter(|id| !layers.get(*id).is_some_and(is_desired))
            .collect();
        for id in stale {
            if self.discard(id) {
                report.stopped += 1;
            }
        }

        for layer in layers.iter().filter(|l| is_desired(l)) {
            let id = layer.id();
            let current = match self.slots.get(&id) {
                Some(AudioSlot::Live(handle)) => {
                    handle.source_ref() == layer.resource_ref
                        && (has_wildcard(&layer.resource_ref)
                            || locator.locate(&layer.resource_ref).as_deref()
                                == Some(handle.locator()))
                }
                Some(AudioSlot::Pending { source_ref, .. }) => *source_ref == layer.resource_ref,
                None => false,
            };
            if current {
                if let Some(AudioSlot::Live(handle)) = self.slots.get_mut(&id) {
                    if handle.sync(layer.volume(), layer.looping) {
                        report.updated += 1;
                    }
                }
                continue;
            }
            // Reference or locator changed: the old sound goes, a new one starts.
            if self.discard(id) {
                report.stopped += 1;
            }

            match locator.locate(&layer.resource_ref) {
                Some(found) => {
                    self.start_load(layer, found);
                    report.started += 1;
                }
                None => {
                    log::debug!(target: "audio", "layer {} reference {:?} resolves to nothing", id, layer.resource_ref);
                    report.unresolved += 1;
                }
            }
        }

        if !report.is_noop() {
            log::debug!(target: "audio", "reconciled: {:?}", report);
        }
        report
    }

    fn start_load(&mut self, layer: &EffectLayer, locator: String) {
        let ticket = LoadTicket::new(self.next_ticket);
        self.next_ticket += 1;
        self.slots.insert(
            layer.id(),
            AudioSlot::Pending {
                ticket,
                source_ref: layer.resource_ref.clone(),
            },
        );
        self.in_flight.insert(
            ticket,
            InFlight {
                layer: layer.id(),
                source_ref: layer.resource_ref.clone(),
                locator: locator.clone(),
            },
        );
        self.engine
            .play(&locator, play_options(layer), ticket, self.completion_tx.clone());
    }

    /// Remove a slot, stopping it if live. Returns true if a live sound stopped.
    /// A pending load is left to land and stop itself.
    fn discard(&mut self, id: LayerId) -> bool {
        match self.slots.remove(&id) {
            Some(AudioSlot::Live(handle)) => {
                handle.stop();
                true
            }
            Some(AudioSlot::Pending { .. }) | None => false,
        }
    }

    /// Settle finished loads against the current layers. Returns the number
    /// of sounds that became live.
    pub fn drain_completions(&mut self, layers: &LayerStore) -> usize {
        let mut adopted = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.settle(completion, layers) {
                adopted += 1;
            }
        }
        adopted
    }

    fn settle(&mut self, completion: LoadCompletion, layers: &LayerStore) -> bool {
        let LoadCompletion { ticket, result } = completion;
        let Some(load) = self.in_flight.remove(&ticket) else {
            log::warn!(target: "audio", "completion for unknown load {}", ticket.get());
            if let Ok(mut sound) = result {
                sound.stop();
            }
            return false;
        };

        let slot_waiting = matches!(
            self.slots.get(&load.layer),
            Some(AudioSlot::Pending { ticket: t, .. }) if *t == ticket
        );

        let mut sound = match result {
            Ok(sound) => sound,
            Err(e) => {
                log::warn!(target: "audio", "could not load {} for layer {}: {}", load.locator, load.layer, e);
                if slot_waiting {
                    self.slots.remove(&load.layer);
                }
                return false;
            }
        };

        // Validate against the state as it is now, not when the load began.
        let layer = layers
            .get(load.layer)
            .filter(|l| is_desired(l) && l.resource_ref == load.source_ref);
        let Some(layer) = layer.filter(|_| slot_waiting) else {
            log::debug!(target: "audio", "layer {} no longer wants {}; stopping", load.layer, load.locator);
            sound.stop();
            if slot_waiting {
                self.slots.remove(&load.layer);
            }
            return false;
        };

        let mut handle = SoundHandle::new(load.layer, load.source_ref, load.locator, sound);
        handle.sync(layer.volume(), layer.looping);
        self.slots.insert(load.layer, AudioSlot::Live(handle));
        true
    }

    /// Stop every live sound. Loads still in flight stop when they land.
    pub fn stop_all(&mut self) {
        let ids: Vec<LayerId> = self.slots.keys().copied().collect();
        for id in ids {
            self.discard(id);
        }
    }

    pub fn handle(&self, id: LayerId) -> Option<&SoundHandle> {
        match self.slots.get(&id) {
            Some(AudioSlot::Live(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn is_live(&self, id: LayerId) -> bool {
        self.handle(id).is_some()
    }

    pub fn is_pending(&self, id: LayerId) -> bool {
        matches!(self.slots.get(&id), Some(AudioSlot::Pending { .. }))
    }

    pub fn live_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, AudioSlot::Live(_)))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn pending_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, AudioSlot::Pending { .. }))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Loads started but not yet settled, including discarded ones.
    pub fn loads_in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
