use serde::{Deserialize, Serialize};

use super::layer::{EffectLayer, LayerKind, LayerPatch};
use crate::LayerId;

/// Ordered effect layers of a profile.
///
/// List order is paint order within a band. Serialized as the plain list;
/// the id counter is recalculated on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<EffectLayer>", into = "Vec<EffectLayer>")]
pub struct LayerStore {
    layers: Vec<EffectLayer>,
    next_layer_id: u32,
}

impl From<Vec<EffectLayer>> for LayerStore {
    fn from(layers: Vec<EffectLayer>) -> Self {
        let mut store = Self {
            layers,
            next_layer_id: 0,
        };
        store.recalculate_next_layer_id();
        store
    }
}

impl From<LayerStore> for Vec<EffectLayer> {
    fn from(store: LayerStore) -> Self {
        store.layers
    }
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer with default settings and return its stable LayerId
    pub fn add(&mut self, kind: LayerKind) -> LayerId {
        let id = LayerId::new(self.next_layer_id);
        self.next_layer_id += 1;
        let ordinal = self.layers.iter().filter(|l| l.kind == kind).count() + 1;
        let label = format!("{} {}", kind.name(), ordinal);
        self.layers.push(EffectLayer::new(id, kind, label));
        id
    }

    /// Add a layer and apply `patch` to it before it becomes visible.
    pub fn add_with(&mut self, kind: LayerKind, patch: &LayerPatch) -> LayerId {
        let id = self.add(kind);
        if let Some(layer) = self.get_mut(id) {
            patch.apply(layer);
        }
        id
    }

    pub fn get(&self, id: LayerId) -> Option<&EffectLayer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut EffectLayer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    /// Get the position of a layer in the list by LayerId
    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.position(id).is_some()
    }

    /// Remove a layer by its LayerId, returns true if removed
    pub fn remove(&mut self, id: LayerId) -> bool {
        if let Some(pos) = self.position(id) {
            self.layers.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn set_disabled(&mut self, id: LayerId, disabled: bool) -> bool {
        match self.get_mut(id) {
            Some(layer) if layer.disabled != disabled => {
                layer.disabled = disabled;
                true
            }
            _ => false,
        }
    }

    pub fn set_loop(&mut self, id: LayerId, looping: bool) -> bool {
        match self.get_mut(id) {
            Some(layer) if layer.looping != looping => {
                layer.looping = looping;
                true
            }
            _ => false,
        }
    }

    pub fn mutate(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        self.get_mut(id).is_some_and(|layer| patch.apply(layer))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectLayer> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EffectLayer> {
        self.layers.iter_mut()
    }

    pub fn as_slice(&self) -> &[EffectLayer] {
        &self.layers
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Raw list access for the reorder rules, which keep the id set intact.
    pub(crate) fn layers_mut(&mut self) -> &mut Vec<EffectLayer> {
        &mut self.layers
    }

    /// Recalculate next_layer_id from existing layers (used after loading)
    pub fn recalculate_next_layer_id(&mut self) {
        self.next_layer_id = self
            .layers
            .iter()
            .map(|l| l.id().get())
            .max()
            .map_or(0, |m| m + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Band;

    #[test]
    fn add_assigns_unique_ids_and_defaults() {
        let mut store = LayerStore::new();
        let v = store.add(LayerKind::Visual);
        let a = store.add(LayerKind::Audio);
        let v2 = store.add(LayerKind::Visual);
        assert_ne!(v, a);
        assert_ne!(v, v2);
        let visual = store.get(v).unwrap();
        assert_eq!(visual.band, Band::Above);
        assert_eq!(visual.scale, 100.0);
        assert_eq!(visual.opacity, 1.0);
        assert_eq!(visual.label, "Visual 1");
        assert_eq!(store.get(v2).unwrap().label, "Visual 2");
        let audio = store.get(a).unwrap();
        assert!(audio.looping);
        assert_eq!(audio.volume(), 1.0);
    }

    #[test]
    fn ids_not_reused_after_remove() {
        let mut store = LayerStore::new();
        let first = store.add(LayerKind::Visual);
        assert!(store.remove(first));
        let second = store.add(LayerKind::Visual);
        assert_ne!(first, second);
    }

    #[test]
    fn operations_on_missing_id_are_no_ops() {
        let mut store = LayerStore::new();
        store.add(LayerKind::Visual);
        let before = store.clone();
        let ghost = LayerId::new(99);
        assert!(!store.remove(ghost));
        assert!(!store.set_disabled(ghost, true));
        assert!(!store.set_loop(ghost, false));
        assert!(!store.mutate(ghost, &LayerPatch { scale: Some(5.0), ..Default::default() }));
        assert_eq!(store, before);
    }

    #[test]
    fn set_disabled_reports_change() {
        let mut store = LayerStore::new();
        let id = store.add(LayerKind::Audio);
        assert!(store.set_disabled(id, true));
        assert!(!store.set_disabled(id, true));
        assert!(store.get(id).unwrap().disabled);
        assert!(store.set_loop(id, false));
        assert!(!store.get(id).unwrap().looping);
    }

    #[test]
    fn deserialized_store_continues_id_sequence() {
        let mut store = LayerStore::new();
        store.add(LayerKind::Visual);
        store.add(LayerKind::Visual);
        let json = serde_json::to_string(&store).unwrap();
        assert!(json.starts_with('['));
        let mut loaded: LayerStore = serde_json::from_str(&json).unwrap();
        let next = loaded.add(LayerKind::Audio);
        assert_eq!(next, LayerId::new(2));
    }
}
