//! Drag-and-drop reordering of effect layers.
//!
//! A move is always a permutation of the layer list. Visual layers dropped
//! into a band take that band; audio layers stay in the audio zone.

use serde::{Deserialize, Serialize};

use crate::{Band, EffectLayer, LayerId, LayerKind, LayerStore};

/// Where a dragged layer is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropZone {
    Above,
    Below,
    Audio,
}

impl DropZone {
    pub fn accepts(&self, kind: LayerKind) -> bool {
        match self {
            DropZone::Above | DropZone::Below => kind == LayerKind::Visual,
            DropZone::Audio => kind == LayerKind::Audio,
        }
    }

    pub fn band(&self) -> Option<Band> {
        match self {
            DropZone::Above => Some(Band::Above),
            DropZone::Below => Some(Band::Below),
            DropZone::Audio => None,
        }
    }

    /// Zone a layer currently sits in.
    pub fn of(layer: &EffectLayer) -> DropZone {
        match layer.effective_band() {
            Some(Band::Above) => DropZone::Above,
            Some(Band::Below) => DropZone::Below,
            None => DropZone::Audio,
        }
    }

    fn contains(&self, layer: &EffectLayer) -> bool {
        DropZone::of(layer) == *self
    }
}

/// Move `dragged` into `zone`, next to `target` when given.
///
/// Moving toward the end of the list lands after the target, moving toward
/// the start lands before it. Without a target the layer goes right after
/// the last layer already in the zone, or to the end of the list.
/// Returns true if order or band changed.
pub fn move_layer(
    store: &mut LayerStore,
    dragged: LayerId,
    zone: DropZone,
    target: Option<LayerId>,
) -> bool {
    let Some(from) = store.position(dragged) else {
        return false;
    };
    let kind = store.as_slice()[from].kind;
    if !zone.accepts(kind) {
        return false;
    }

    let target_pos = match target {
        Some(target) if target != dragged => {
            let Some(pos) = store.position(target) else {
                return false;
            };
            if store.as_slice()[pos].kind != kind {
                return false;
            }
            Some(pos)
        }
        _ => None,
    };

    let before: Vec<(LayerId, Band)> = store.iter().map(|l| (l.id(), l.band)).collect();

    let layers = store.layers_mut();
    let mut layer = layers.remove(from);
    if let Some(band) = zone.band() {
        layer.band = band;
    }

    let insert_at = if target == Some(dragged) {
        from
    } else if let Some(pos) = target_pos {
        // Original target index works for both directions once the
        // dragged layer is out of the list.
        pos
    } else {
        layers
            .iter()
            .rposition(|l| zone.contains(l))
            .map_or(layers.len(), |last| last + 1)
    };
    layers.insert(insert_at, layer);

    let after: Vec<(LayerId, Band)> = store.iter().map(|l| (l.id(), l.band)).collect();
    before != after
}
