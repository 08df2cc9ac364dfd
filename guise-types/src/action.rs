//! Editor commands and the field vocabulary of the editing surface.
//!
//! Every user intent is an [`EditorCommand`]. Structural commands reshape the
//! profile and force the editing surface to rebuild; field edits only change
//! the in-flight values the preview is derived from.

use serde::{Deserialize, Serialize};

use crate::{
    Anchor, Band, BlendMode, Disposition, LayerId, LayerKind, LightAnimationKind, ProfileMode,
    Rgb, RingEffect,
};

pub use crate::reorder::DropZone;

// ============================================================================
// Field vocabulary
// ============================================================================

/// Profile-level metadata fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProfileField {
    Label,
    Category,
    Tags,
    Mode,
    Delay,
}

/// Nullable base-sprite overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeField {
    Name,
    Texture,
    Scale,
    MirrorX,
    MirrorY,
    Alpha,
    Width,
    Height,
    LockRotation,
    Disposition,
    Portrait,
    Anchor,
}

impl ChangeField {
    /// Value a freshly activated override starts from.
    pub fn default_value(&self) -> FieldValue {
        match self {
            ChangeField::Name | ChangeField::Texture | ChangeField::Portrait => {
                FieldValue::Text(String::new())
            }
            ChangeField::Scale | ChangeField::Alpha | ChangeField::Width | ChangeField::Height => {
                FieldValue::Number(1.0)
            }
            ChangeField::MirrorX | ChangeField::MirrorY | ChangeField::LockRotation => {
                FieldValue::Flag(false)
            }
            ChangeField::Disposition => FieldValue::Disposition(Disposition::Neutral),
            ChangeField::Anchor => FieldValue::Point(Anchor::CENTER.x, Anchor::CENTER.y),
        }
    }
}

/// Per-layer editable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LayerField {
    Label,
    ResourceRef,
    Scale,
    /// Volume for audio layers.
    Opacity,
    RotationDegrees,
    RotationRandom,
    Band,
    BlendMode,
    Tint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LightField {
    Dim,
    Bright,
    Color,
    Alpha,
    Angle,
    Luminosity,
    Priority,
    AnimationKind,
    AnimationSpeed,
    AnimationIntensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RingField {
    RingColor,
    BackgroundColor,
    SubjectRef,
    SubjectScale,
    Effect(RingEffect),
}

/// Addresses one field of the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    Profile(ProfileField),
    Change(ChangeField),
    Layer(LayerId, LayerField),
    Light(LightField),
    Ring(RingField),
}

impl FieldKey {
    /// Override fields can be switched off, which clears them to `None`.
    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldKey::Change(_) | FieldKey::Layer(_, LayerField::Tint))
    }

    pub fn layer(&self) -> Option<LayerId> {
        match self {
            FieldKey::Layer(id, _) => Some(*id),
            _ => None,
        }
    }
}

/// Raw value typed into a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Color(Rgb),
    Point(f32, f32),
    Mode(ProfileMode),
    Disposition(Disposition),
    Band(Band),
    Blend(BlendMode),
    Animation(LightAnimationKind),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgb> {
        match self {
            FieldValue::Color(c) => Some(*c),
            FieldValue::Text(s) => Rgb::from_hex(s.trim()),
            _ => None,
        }
    }
}

/// Kind of control a field edit came from; decides how fast the preview
/// follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    /// Slider or other continuous range.
    Range,
    /// Free text entry.
    Text,
    /// Checkbox, select, button.
    Discrete,
}

/// Which part of the profile the inspector shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InspectorTarget {
    #[default]
    Base,
    Layer(LayerId),
    Light,
    Ring,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorCommand {
    AddLayer(LayerKind),
    RemoveLayer(LayerId),
    SetLayerDisabled(LayerId, bool),
    SetLayerLoop(LayerId, bool),
    MoveLayer {
        id: LayerId,
        zone: DropZone,
        target: Option<LayerId>,
    },
    ToggleLight(bool),
    ToggleRing(bool),
    SelectTarget(InspectorTarget),
    EditField {
        key: FieldKey,
        value: FieldValue,
        control: ControlKind,
    },
    SetFieldActive {
        key: FieldKey,
        active: bool,
    },
}

impl EditorCommand {
    /// Structural commands rebuild the editing surface.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            EditorCommand::EditField { .. } | EditorCommand::SetFieldActive { .. }
        )
    }

    /// Whether the command can change which sounds should play.
    pub fn touches_audio(&self) -> bool {
        match self {
            EditorCommand::AddLayer(kind) => *kind == LayerKind::Audio,
            EditorCommand::RemoveLayer(_)
            | EditorCommand::SetLayerDisabled(_, _)
            | EditorCommand::SetLayerLoop(_, _)
            | EditorCommand::MoveLayer { .. } => true,
            EditorCommand::ToggleLight(_)
            | EditorCommand::ToggleRing(_)
            | EditorCommand::SelectTarget(_) => false,
            EditorCommand::EditField { key, .. } | EditorCommand::SetFieldActive { key, .. } => {
                key.layer().is_some()
            }
        }
    }
}
