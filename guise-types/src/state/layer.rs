use serde::{Deserialize, Serialize};

use crate::{LayerId, Rgb};

/// Whether a layer draws something or plays something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Visual,
    Audio,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Visual => "Visual",
            LayerKind::Audio => "Audio",
        }
    }
}

/// Paint stratum of a visual layer relative to the base sprite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    #[default]
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
}

impl BlendMode {
    /// CSS `mix-blend-mode` keyword used by the preview surface.
    pub fn css_name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Add => "plus-lighter",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
        }
    }
}

/// One supplementary effect of a profile.
///
/// `opacity` doubles as the volume of an audio layer. `band`, `scale`,
/// rotation, blend and tint are carried for audio layers but never read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectLayer {
    id: LayerId,
    pub kind: LayerKind,
    pub label: String,
    #[serde(default)]
    pub resource_ref: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default = "default_true")]
    pub looping: bool,
    /// Percent; 100 is the sprite's natural size.
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub rotation_degrees: f32,
    #[serde(default)]
    pub rotation_random: bool,
    #[serde(default)]
    pub band: Band,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub tint: Option<Rgb>,
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f32 {
    100.0
}

fn default_opacity() -> f32 {
    1.0
}

impl EffectLayer {
    pub fn new(id: LayerId, kind: LayerKind, label: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
            resource_ref: String::new(),
            disabled: false,
            looping: true,
            scale: default_scale(),
            opacity: default_opacity(),
            rotation_degrees: 0.0,
            rotation_random: false,
            band: Band::Above,
            blend_mode: BlendMode::Normal,
            tint: None,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn is_audio(&self) -> bool {
        self.kind == LayerKind::Audio
    }

    pub fn is_visual(&self) -> bool {
        self.kind == LayerKind::Visual
    }

    pub fn volume(&self) -> f32 {
        self.opacity
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.opacity = volume.clamp(0.0, 1.0);
    }

    /// Has a resource reference and is not switched off.
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.resource_ref.trim().is_empty()
    }

    /// Band for visual layers, `None` for audio.
    pub fn effective_band(&self) -> Option<Band> {
        match self.kind {
            LayerKind::Visual => Some(self.band),
            LayerKind::Audio => None,
        }
    }
}

/// Partial update for a layer's editable fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerPatch {
    pub label: Option<String>,
    pub resource_ref: Option<String>,
    pub scale: Option<f32>,
    pub opacity: Option<f32>,
    pub rotation_degrees: Option<f32>,
    pub rotation_random: Option<bool>,
    pub band: Option<Band>,
    pub blend_mode: Option<BlendMode>,
    pub tint: Option<Option<Rgb>>,
}

impl LayerPatch {
    pub fn is_empty(&self) -> bool {
        *self == LayerPatch::default()
    }

    /// Apply the patch, returning true if any field changed.
    pub fn apply(&self, layer: &mut EffectLayer) -> bool {
        let before = layer.clone();
        if let Some(label) = &self.label {
            layer.label = label.clone();
        }
        if let Some(resource_ref) = &self.resource_ref {
            layer.resource_ref = resource_ref.clone();
        }
        if let Some(scale) = self.scale {
            layer.scale = scale.max(0.0);
        }
        if let Some(opacity) = self.opacity {
            layer.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(degrees) = self.rotation_degrees {
            layer.rotation_degrees = degrees;
        }
        if let Some(random) = self.rotation_random {
            layer.rotation_random = random;
        }
        if let Some(band) = self.band {
            if layer.is_visual() {
                layer.band = band;
            }
        }
        if let Some(blend) = self.blend_mode {
            layer.blend_mode = blend;
        }
        if let Some(tint) = self.tint {
            layer.tint = tint;
        }
        *layer != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_clamps_opacity_and_ignores_band_on_audio() {
        let mut layer = EffectLayer::new(LayerId::new(0), LayerKind::Audio, "Audio 1");
        let patch = LayerPatch {
            opacity: Some(3.0),
            band: Some(Band::Below),
            ..Default::default()
        };
        assert!(patch.apply(&mut layer));
        assert_eq!(layer.volume(), 1.0);
        assert_eq!(layer.band, Band::Above);
        assert_eq!(layer.effective_band(), None);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut layer = EffectLayer::new(LayerId::new(0), LayerKind::Visual, "Visual 1");
        assert!(LayerPatch::default().is_empty());
        assert!(!LayerPatch::default().apply(&mut layer));
    }

    #[test]
    fn pathless_layer_is_inactive() {
        let mut layer = EffectLayer::new(LayerId::new(0), LayerKind::Visual, "v");
        assert!(!layer.is_active());
        layer.resource_ref = "fx/glow.webm".to_string();
        assert!(layer.is_active());
        layer.disabled = true;
        assert!(!layer.is_active());
    }

    #[test]
    fn deserialize_fills_defaults() {
        let layer: EffectLayer =
            serde_json::from_str(r#"{"id":3,"kind":"Visual","label":"glow"}"#).unwrap();
        assert_eq!(layer.id(), LayerId::new(3));
        assert!(layer.looping);
        assert_eq!(layer.scale, 100.0);
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.band, Band::Above);
    }
}
