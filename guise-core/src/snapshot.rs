//! In-flight field edits and the snapshot/restore cycle around structural
//! commands.
//!
//! The editing surface keeps typed values in an [`EditBuffer`] until they are
//! folded into the profile. [`extract`] is the one rule that turns baseline
//! plus edits into a profile; preview, snapshot and save all go through it.

use std::collections::BTreeMap;

use guise_types::{
    AppearanceProfile, ChangeField, FieldKey, FieldValue, LayerField, LayerPatch, LightField,
    ProfileField, Rgb, RingField, Tags,
};

/// State of one edited field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Active(FieldValue),
    /// Override switched off; extracts as `None`.
    Inactive,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBuffer {
    edits: BTreeMap<FieldKey, FieldEdit>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: FieldKey, value: FieldValue) {
        self.edits.insert(key, FieldEdit::Active(value));
    }

    /// Switch a nullable override on or off. Turning one on starts from the
    /// key's default, not from whatever it held before; an override already
    /// set in `baseline` with no edit on top stays as it is. Returns false for
    /// keys that cannot be switched off or when nothing changed.
    pub fn set_active(&mut self, key: FieldKey, active: bool, baseline: &AppearanceProfile) -> bool {
        if !key.is_nullable() {
            return false;
        }
        let was_active = match self.edits.get(&key) {
            Some(FieldEdit::Active(_)) => true,
            Some(FieldEdit::Inactive) => false,
            None => baseline_is_set(baseline, &key),
        };
        if was_active == active {
            return false;
        }
        let edit = if active {
            FieldEdit::Active(default_value(&key))
        } else {
            FieldEdit::Inactive
        };
        self.edits.insert(key, edit);
        true
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldEdit> {
        self.edits.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldEdit)> {
        self.edits.iter()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    /// Drop edits addressed to layers the profile no longer has.
    pub fn retain_layers(&mut self, profile: &AppearanceProfile) {
        self.edits
            .retain(|key, _| key.layer().map_or(true, |id| profile.effects.contains(id)));
    }
}

fn default_value(key: &FieldKey) -> FieldValue {
    match key {
        FieldKey::Change(field) => field.default_value(),
        FieldKey::Layer(_, LayerField::Tint) => FieldValue::Color(Rgb::WHITE),
        _ => FieldValue::Text(String::new()),
    }
}

/// Baseline with every edit applied. Values of the wrong shape are skipped.
pub fn extract(baseline: &AppearanceProfile, edits: &EditBuffer) -> AppearanceProfile {
    let mut profile = baseline.clone();
    for (key, edit) in edits.iter() {
        if !apply_edit(&mut profile, key, edit) {
            log::debug!(target: "session", "ignored edit {:?} = {:?}", key, edit);
        }
    }
    profile
}

/// Edits captured before a structural command touches the baseline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    edits: EditBuffer,
}

impl Snapshot {
    pub fn capture(baseline: &AppearanceProfile, edits: &EditBuffer) -> Self {
        let mut edits = edits.clone();
        edits.retain_layers(baseline);
        Self { edits }
    }

    /// Re-apply captured values on top of the reloaded profile. Captured
    /// values win; those for removed layers are dropped.
    pub fn restore(&self, reloaded: &AppearanceProfile) -> AppearanceProfile {
        let mut edits = self.edits.clone();
        edits.retain_layers(reloaded);
        extract(reloaded, &edits)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

fn apply_edit(profile: &mut AppearanceProfile, key: &FieldKey, edit: &FieldEdit) -> bool {
    match (key, edit) {
        (FieldKey::Change(field), FieldEdit::Inactive) => {
            clear_change(profile, *field);
            true
        }
        (FieldKey::Layer(id, LayerField::Tint), FieldEdit::Inactive) => {
            let patch = LayerPatch {
                tint: Some(None),
                ..Default::default()
            };
            profile.effects.mutate(*id, &patch);
            true
        }
        (_, FieldEdit::Inactive) => false,
        (FieldKey::Profile(field), FieldEdit::Active(value)) => {
            apply_profile_field(profile, *field, value)
        }
        (FieldKey::Change(field), FieldEdit::Active(value)) => {
            apply_change(profile, *field, value)
        }
        (FieldKey::Layer(id, field), FieldEdit::Active(value)) => match layer_patch(*field, value) {
            Some(patch) => {
                profile.effects.mutate(*id, &patch);
                true
            }
            None => false,
        },
        (FieldKey::Light(field), FieldEdit::Active(value)) => apply_light(profile, *field, value),
        (FieldKey::Ring(field), FieldEdit::Active(value)) => apply_ring(profile, *field, value),
    }
}

fn apply_profile_field(profile: &mut AppearanceProfile, field: ProfileField, value: &FieldValue) -> bool {
    match (field, value) {
        (ProfileField::Label, FieldValue::Text(s)) => profile.label = s.clone(),
        (ProfileField::Category, FieldValue::Text(s)) => profile.category = s.trim().to_string(),
        (ProfileField::Tags, FieldValue::Text(s)) => profile.tags = Tags::parse(s),
        (ProfileField::Mode, FieldValue::Mode(mode)) => profile.mode = *mode,
        (ProfileField::Delay, v) => match v.as_number() {
            Some(ms) => profile.delay = ms.round() as i64,
            None => return false,
        },
        _ => return false,
    }
    true
}

fn clear_change(profile: &mut AppearanceProfile, field: ChangeField) {
    let c = &mut profile.changes;
    match field {
        ChangeField::Name => c.name = None,
        ChangeField::Texture => c.texture = None,
        ChangeField::Scale => c.scale = None,
        ChangeField::MirrorX => c.mirror_x = None,
        ChangeField::MirrorY => c.mirror_y = None,
        ChangeField::Alpha => c.alpha = None,
        ChangeField::Width => c.width = None,
        ChangeField::Height => c.height = None,
        ChangeField::LockRotation => c.lock_rotation = None,
        ChangeField::Disposition => c.disposition = None,
        ChangeField::Portrait => c.portrait = None,
        ChangeField::Anchor => c.anchor = None,
    }
}

fn apply_change(profile: &mut AppearanceProfile, field: ChangeField, value: &FieldValue) -> bool {
    let c = &mut profile.changes;
    let number = || value.as_number().map(|n| n as f32);
    let text = || value.as_text().map(str::to_string);
    match field {
        ChangeField::Name => c.name = text(),
        ChangeField::Texture => c.texture = text(),
        ChangeField::Portrait => c.portrait = text(),
        ChangeField::Scale => c.scale = number(),
        ChangeField::Alpha => c.alpha = number().map(|a| a.clamp(0.0, 1.0)),
        ChangeField::Width => c.width = number().map(|w| w.max(0.0)),
        ChangeField::Height => c.height = number().map(|h| h.max(0.0)),
        ChangeField::MirrorX => c.mirror_x = value.as_flag(),
        ChangeField::MirrorY => c.mirror_y = value.as_flag(),
        ChangeField::LockRotation => c.lock_rotation = value.as_flag(),
        ChangeField::Disposition => {
            c.disposition = match value {
                FieldValue::Disposition(d) => Some(*d),
                _ => None,
            }
        }
        ChangeField::Anchor => {
            c.anchor = match value {
                FieldValue::Point(x, y) => Some(guise_types::Anchor::new(*x, *y)),
                _ => None,
            }
        }
    }
    // A shape mismatch leaves the override cleared rather than stale.
    change_is_set(&profile.changes, field)
}

fn baseline_is_set(baseline: &AppearanceProfile, key: &FieldKey) -> bool {
    match key {
        FieldKey::Change(field) => change_is_set(&baseline.changes, *field),
        FieldKey::Layer(id, LayerField::Tint) => {
            baseline.effects.get(*id).is_some_and(|l| l.tint.is_some())
        }
        _ => false,
    }
}

fn change_is_set(c: &guise_types::ProfileChanges, field: ChangeField) -> bool {
    match field {
        ChangeField::Name => c.name.is_some(),
        ChangeField::Texture => c.texture.is_some(),
        ChangeField::Portrait => c.portrait.is_some(),
        ChangeField::Scale => c.scale.is_some(),
        ChangeField::Alpha => c.alpha.is_some(),
        ChangeField::Width => c.width.is_some(),
        ChangeField::Height => c.height.is_some(),
        ChangeField::MirrorX => c.mirror_x.is_some(),
        ChangeField::MirrorY => c.mirror_y.is_some(),
        ChangeField::LockRotation => c.lock_rotation.is_some(),
        ChangeField::Disposition => c.disposition.is_some(),
        ChangeField::Anchor => c.anchor.is_some(),
    }
}

fn layer_patch(field: LayerField, value: &FieldValue) -> Option<LayerPatch> {
    let mut patch = LayerPatch::default();
    match field {
        LayerField::Label => patch.label = Some(value.as_text()?.to_string()),
        LayerField::ResourceRef => patch.resource_ref = Some(value.as_text()?.trim().to_string()),
        LayerField::Scale => patch.scale = Some(value.as_number()? as f32),
        LayerField::Opacity => patch.opacity = Some(value.as_number()? as f32),
        LayerField::RotationDegrees => patch.rotation_degrees = Some(value.as_number()? as f32),
        LayerField::RotationRandom => patch.rotation_random = Some(value.as_flag()?),
        LayerField::Band => match value {
            FieldValue::Band(band) => patch.band = Some(*band),
            _ => return None,
        },
        LayerField::BlendMode => match value {
            FieldValue::Blend(mode) => patch.blend_mode = Some(*mode),
            _ => return None,
        },
        LayerField::Tint => patch.tint = Some(Some(value.as_color()?)),
    }
    Some(patch)
}

fn apply_light(profile: &mut AppearanceProfile, field: LightField, value: &FieldValue) -> bool {
    let light = &mut profile.light;
    if let LightField::Color = field {
        return match value.as_color() {
            Some(color) => {
                light.color = color;
                true
            }
            None => false,
        };
    }
    if let LightField::AnimationKind = field {
        return match value {
            FieldValue::Animation(kind) => {
                light.animation.kind = *kind;
                true
            }
            _ => false,
        };
    }
    let Some(n) = value.as_number() else {
        return false;
    };
    let step = || n.round().clamp(0.0, 255.0) as u8;
    match field {
        LightField::Dim => light.set_dim(n as f32),
        LightField::Bright => light.set_bright(n as f32),
        LightField::Alpha => light.set_alpha(n as f32),
        LightField::Angle => light.set_angle(n as f32),
        LightField::Luminosity => light.set_luminosity(n as f32),
        LightField::Priority => light.priority = n.round() as i32,
        LightField::AnimationSpeed => light.animation.set_speed(step()),
        LightField::AnimationIntensity => light.animation.set_intensity(step()),
        LightField::Color | LightField::AnimationKind => return false,
    }
    true
}

fn apply_ring(profile: &mut AppearanceProfile, field: RingField, value: &FieldValue) -> bool {
    let ring = &mut profile.ring;
    match field {
        RingField::RingColor => ring.colors.ring = blank_or_color(value),
        RingField::BackgroundColor => ring.colors.background = blank_or_color(value),
        RingField::SubjectRef => match value.as_text() {
            Some(s) => ring.subject.resource_ref = s.trim().to_string(),
            None => return false,
        },
        RingField::SubjectScale => match value.as_number() {
            Some(n) => ring.subject.scale = (n as f32).max(0.0),
            None => return false,
        },
        RingField::Effect(effect) => match value.as_flag() {
            Some(on) => ring.effects.set(effect, on),
            None => return false,
        },
    }
    true
}

/// Empty text clears a ring color.
fn blank_or_color(value: &FieldValue) -> Option<Rgb> {
    match value {
        FieldValue::Text(s) if s.trim().is_empty() => None,
        v => v.as_color(),
    }
}
