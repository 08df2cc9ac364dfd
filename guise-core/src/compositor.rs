//! Live-preview derivation.
//!
//! [`compose`] turns an extracted profile into a [`RenderDescriptor`] for the
//! preview surface. It is pure: resource references are resolved beforehand
//! into a [`ResolvedRefs`] table, so composing the same input twice yields
//! the same descriptor.

use std::collections::HashMap;

use serde::Serialize;

use guise_types::{
    Anchor, AppearanceProfile, Band, BlendMode, Disposition, EffectLayer, LayerId, LayerKind,
    LightAnimationKind, LightProfile, ProfileMode, Rgb, RingEffects, RingProfile,
};

use crate::resolver::{Locate, ResourceResolver};

/// Reference string → resolved locator (or `None` when it resolves to nothing).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRefs {
    map: HashMap<String, Option<String>>,
}

impl ResolvedRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, locator: Option<String>) {
        self.map.insert(reference.into(), locator);
    }

    pub fn get(&self, reference: &str) -> Option<&str> {
        self.map.get(reference).and_then(|l| l.as_deref())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Resolve references the profile uses that are not cached yet and drop
    /// the ones it no longer uses. Cached picks stay stable; references that
    /// resolved to nothing are tried again. Returns true when some reference
    /// gained a locator.
    pub fn refresh(&mut self, profile: &AppearanceProfile, resolver: &mut ResourceResolver) -> bool {
        let wanted = references(profile);
        self.map
            .retain(|r, locator| locator.is_some() && wanted.iter().any(|w| w == r));
        let mut gained = false;
        for reference in wanted {
            if !self.map.contains_key(&reference) {
                let locator = resolver.resolve(&reference);
                gained |= locator.is_some();
                self.map.insert(reference, locator);
            }
        }
        gained
    }
}

/// Lookups go through the cache so sounds play what the preview shows.
impl Locate for ResolvedRefs {
    fn locate(&mut self, reference: &str) -> Option<String> {
        self.get(reference.trim()).map(str::to_string)
    }
}

/// Every non-empty resource reference a profile touches.
pub fn references(profile: &AppearanceProfile) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |r: &str| {
        let r = r.trim();
        if !r.is_empty() && !out.iter().any(|o| o == r) {
            out.push(r.to_string());
        }
    };
    if let Some(texture) = &profile.changes.texture {
        push(texture);
    }
    if let Some(portrait) = &profile.changes.portrait {
        push(portrait);
    }
    push(&profile.ring.subject.resource_ref);
    for layer in profile.effects.iter() {
        push(&layer.resource_ref);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewContext {
    /// Scene distance covered by one grid square.
    pub grid_distance: f32,
}

impl Default for PreviewContext {
    fn default() -> Self {
        Self { grid_distance: 5.0 }
    }
}

pub struct PreviewInput<'a> {
    pub profile: &'a AppearanceProfile,
    pub resolved: &'a ResolvedRefs,
    pub context: PreviewContext,
}

/// Translate-then-scale transform of a sprite around its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpriteTransform {
    /// Percent of the sprite's own size.
    pub translate_x_pct: f32,
    pub translate_y_pct: f32,
    /// Negative when mirrored.
    pub scale_x: f32,
    pub scale_y: f32,
}

impl SpriteTransform {
    fn new(anchor: Anchor, scale_x: f32, scale_y: f32) -> Self {
        Self {
            translate_x_pct: -anchor.x * 100.0,
            translate_y_pct: -anchor.y * 100.0,
            scale_x,
            scale_y,
        }
    }

    pub fn css(&self) -> String {
        format!(
            "translate({}%, {}%) scale({}, {})",
            self.translate_x_pct, self.translate_y_pct, self.scale_x, self.scale_y
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingDescriptor {
    pub transform: SpriteTransform,
    pub subject: Option<String>,
    pub ring_color: Option<Rgb>,
    pub background_color: Option<Rgb>,
    pub effects: RingEffects,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnimationDescriptor {
    pub kind: LightAnimationKind,
    pub duration_secs: f32,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightDescriptor {
    /// Light diameter relative to the token width.
    pub size_ratio: f32,
    /// Share of the radius that is bright light, 0..=1.
    pub brightness_pct: f32,
    pub color: Rgb,
    pub intensity: f32,
    pub darkness: bool,
    pub angle: f32,
    pub priority: i32,
    pub animation: Option<AnimationDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualStyle {
    pub scale: f32,
    pub rotation_degrees: f32,
    pub rotation_random: bool,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub tint: Option<Rgb>,
}

impl VisualStyle {
    pub fn css(&self) -> String {
        let mut css = format!(
            "transform: scale({}) rotate({}deg); opacity: {}; mix-blend-mode: {};",
            self.scale,
            self.rotation_degrees,
            self.opacity,
            self.blend_mode.css_name()
        );
        if let Some(tint) = self.tint {
            css.push_str(&format!(" --tint: {};", tint));
        }
        css
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub label: String,
    pub kind: LayerKind,
    pub band: Option<Band>,
    pub disabled: bool,
    pub looping: bool,
    /// Multiplier; 1.0 is natural size.
    pub scale: f32,
    /// Volume for audio layers.
    pub opacity: f32,
    pub locator: Option<String>,
    /// Enabled and has a reference.
    pub active: bool,
    /// Visual layers that are active; `None` otherwise.
    pub style: Option<VisualStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderDescriptor {
    pub label: String,
    pub mode: ProfileMode,
    pub name: Option<String>,
    pub texture: Option<String>,
    pub portrait: Option<String>,
    pub alpha: f32,
    pub width: f32,
    pub height: f32,
    pub lock_rotation: bool,
    pub disposition: Option<Disposition>,
    pub delay_ms: i64,
    pub base: SpriteTransform,
    pub ring: Option<RingDescriptor>,
    pub light: Option<LightDescriptor>,
    pub effects_above: Vec<LayerDescriptor>,
    pub effects_below: Vec<LayerDescriptor>,
    pub audio: Vec<LayerDescriptor>,
}

impl RenderDescriptor {
    /// Audio layers that should be heard.
    pub fn audio_set(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.audio.iter().filter(|l| l.active)
    }
}

/// Build the preview description for the given profile state.
pub fn compose(input: &PreviewInput<'_>) -> RenderDescriptor {
    let profile = input.profile;
    let changes = &profile.changes;
    let resolve = |r: &Option<String>| r.as_deref().and_then(|r| input.resolved.get(r.trim())).map(str::to_string);

    let anchor = changes.anchor.unwrap_or_default();
    let scale = changes.scale.unwrap_or(1.0);
    let sign = |mirrored: Option<bool>| if mirrored.unwrap_or(false) { -1.0 } else { 1.0 };
    let (sx, sy) = (scale * sign(changes.mirror_x), scale * sign(changes.mirror_y));
    let width = changes.width.unwrap_or(1.0);

    let mut effects_above = Vec::new();
    let mut effects_below = Vec::new();
    let mut audio = Vec::new();
    for layer in profile.effects.iter() {
        let descriptor = layer_descriptor(layer, input.resolved);
        match layer.effective_band() {
            Some(Band::Above) => effects_above.push(descriptor),
            Some(Band::Below) => effects_below.push(descriptor),
            None => audio.push(descriptor),
        }
    }

    RenderDescriptor {
        label: profile.label.clone(),
        mode: profile.mode,
        name: changes.name.clone(),
        texture: resolve(&changes.texture),
        portrait: resolve(&changes.portrait),
        alpha: changes.alpha.unwrap_or(1.0).clamp(0.0, 1.0),
        width,
        height: changes.height.unwrap_or(1.0),
        lock_rotation: changes.lock_rotation.unwrap_or(false),
        disposition: changes.disposition,
        delay_ms: profile.delay,
        base: SpriteTransform::new(anchor, sx, sy),
        ring: profile
            .ring
            .enabled
            .then(|| ring_descriptor(&profile.ring, anchor, sx, sy, input.resolved)),
        light: profile
            .light
            .active
            .then(|| light_descriptor(&profile.light, input.context.grid_distance, width)),
        effects_above,
        effects_below,
        audio,
    }
}

fn layer_descriptor(layer: &EffectLayer, resolved: &ResolvedRefs) -> LayerDescriptor {
    let active = layer.is_active();
    let style = (active && layer.is_visual()).then(|| VisualStyle {
        scale: layer.scale / 100.0,
        rotation_degrees: layer.rotation_degrees,
        rotation_random: layer.rotation_random,
        opacity: layer.opacity,
        blend_mode: layer.blend_mode,
        tint: layer.tint,
    });
    LayerDescriptor {
        id: layer.id(),
        label: layer.label.clone(),
        kind: layer.kind,
        band: layer.effective_band(),
        disabled: layer.disabled,
        looping: layer.looping,
        scale: layer.scale / 100.0,
        opacity: layer.opacity,
        locator: resolved.get(layer.resource_ref.trim()).map(str::to_string),
        active,
        style,
    }
}

fn ring_descriptor(
    ring: &RingProfile,
    anchor: Anchor,
    sx: f32,
    sy: f32,
    resolved: &ResolvedRefs,
) -> RingDescriptor {
    let subject_scale = ring.subject.scale;
    RingDescriptor {
        transform: SpriteTransform::new(anchor, sx * subject_scale, sy * subject_scale),
        subject: resolved
            .get(ring.subject.resource_ref.trim())
            .map(str::to_string),
        ring_color: ring.colors.ring,
        background_color: ring.colors.background,
        effects: ring.effects,
    }
}

fn light_descriptor(light: &LightProfile, grid_distance: f32, token_width: f32) -> LightDescriptor {
    let radius = light.radius();
    let size_ratio = if radius > 0.0 && grid_distance > 0.0 && token_width > 0.0 {
        (2.0 * radius) / grid_distance / token_width
    } else {
        1.0
    };
    let brightness_pct = if radius > 0.0 { light.bright / radius } else { 0.0 };
    let darkness = light.is_darkness();
    LightDescriptor {
        size_ratio,
        brightness_pct,
        color: if darkness { Rgb::BLACK } else { light.color },
        intensity: (light.alpha * 2.0 * light.luminosity.abs()).min(1.0),
        darkness,
        angle: light.angle,
        priority: light.priority,
        animation: (!light.animation.kind.is_none()).then(|| AnimationDescriptor {
            kind: light.animation.kind,
            duration_secs: animation_duration(light.animation.speed),
            intensity: light.animation.intensity,
        }),
    }
}

/// Seconds per animation cycle for a 1..=10 speed setting.
pub fn animation_duration(speed: u8) -> f32 {
    ((11.0 - f32::from(speed)) * 0.35).max(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::resolver::{BrowseOptions, DirectoryListing, Listing, SourceKind};
    use guise_types::{LayerPatch, RingEffect};
    use std::cell::Cell;
    use std::rc::Rc;

    fn compose_plain(profile: &AppearanceProfile) -> RenderDescriptor {
        let resolved = ResolvedRefs::new();
        compose(&PreviewInput {
            profile,
            resolved: &resolved,
            context: PreviewContext::default(),
        })
    }

    #[test]
    fn below_band_layer_with_scale() {
        let mut profile = AppearanceProfile::new("p");
        let id = profile.effects.add(LayerKind::Visual);
        profile.effects.mutate(
            id,
            &LayerPatch {
                band: Some(Band::Below),
                scale: Some(150.0),
                ..Default::default()
            },
        );
        let out = compose_plain(&profile);
        assert!(out.effects_above.is_empty());
        assert_eq!(out.effects_below.len(), 1);
        assert_eq!(out.effects_below[0].id, id);
        assert_eq!(out.effects_below[0].scale, 1.5);
    }

    #[test]
    fn mirror_flips_scale_and_anchor_translates() {
        let mut profile = AppearanceProfile::new("p");
        profile.changes.scale = Some(2.0);
        profile.changes.mirror_x = Some(true);
        profile.changes.anchor = Some(Anchor::new(0.5, 1.0));
        let out = compose_plain(&profile);
        assert_eq!(out.base.scale_x, -2.0);
        assert_eq!(out.base.scale_y, 2.0);
        assert_eq!(out.base.translate_x_pct, -50.0);
        assert_eq!(out.base.translate_y_pct, -100.0);
        assert_eq!(out.base.css(), "translate(-50%, -100%) scale(-2, 2)");
    }

    #[test]
    fn default_anchor_is_center() {
        let out = compose_plain(&AppearanceProfile::new("p"));
        assert_eq!(out.base.translate_x_pct, -50.0);
        assert_eq!(out.base.translate_y_pct, -50.0);
        assert_eq!(out.base.scale_x, 1.0);
    }

    #[test]
    fn ring_scale_multiplies_profile_scale() {
        let mut profile = AppearanceProfile::new("p");
        profile.changes.scale = Some(1.5);
        profile.ring.enabled = true;
        profile.ring.subject.scale = 0.8;
        profile.ring.effects.set(RingEffect::Wave, true);
        let out = compose_plain(&profile);
        let ring = out.ring.unwrap();
        assert!((ring.transform.scale_x - 1.2).abs() < 1e-6);
        assert_eq!(ring.transform.translate_x_pct, out.base.translate_x_pct);
        assert!(ring.effects.wave);
    }

    #[test]
    fn zero_radius_light_has_unit_size_ratio() {
        let mut profile = AppearanceProfile::new("p");
        profile.light.active = true;
        let light = compose_plain(&profile).light.unwrap();
        assert_eq!(light.size_ratio, 1.0);
        assert_eq!(light.brightness_pct, 0.0);
    }

    #[test]
    fn light_geometry() {
        let mut profile = AppearanceProfile::new("p");
        profile.light.active = true;
        profile.light.dim = 20.0;
        profile.light.bright = 10.0;
        profile.changes.width = Some(2.0);
        let light = compose_plain(&profile).light.unwrap();
        // 2 * 20 / 5 / 2
        assert_eq!(light.size_ratio, 4.0);
        assert_eq!(light.brightness_pct, 0.5);
        assert_eq!(light.intensity, 0.5);
        assert_eq!(light.color, Rgb::WHITE);
    }

    #[test]
    fn darkness_forces_black_and_caps_intensity() {
        let mut profile = AppearanceProfile::new("p");
        profile.light.active = true;
        profile.light.color = Rgb::new(255, 0, 0);
        profile.light.luminosity = -0.9;
        profile.light.alpha = 0.8;
        let light = compose_plain(&profile).light.unwrap();
        assert!(light.darkness);
        assert_eq!(light.color, Rgb::BLACK);
        assert_eq!(light.intensity, 1.0);
    }

    #[test]
    fn animation_duration_has_floor() {
        assert!((animation_duration(5) - 2.1).abs() < 1e-6);
        assert!((animation_duration(1) - 3.5).abs() < 1e-6);
        assert_eq!(animation_duration(10), 0.5);

        let mut profile = AppearanceProfile::new("p");
        profile.light.active = true;
        assert!(compose_plain(&profile).light.unwrap().animation.is_none());
        profile.light.animation.kind = LightAnimationKind::Torch;
        let anim = compose_plain(&profile).light.unwrap().animation.unwrap();
        assert_eq!(anim.kind, LightAnimationKind::Torch);
        assert_eq!(anim.intensity, 5);
    }

    #[test]
    fn disabled_and_pathless_layers_have_no_style_but_stay_listed() {
        let mut profile = AppearanceProfile::new("p");
        let shown = profile.effects.add_with(
            LayerKind::Visual,
            &LayerPatch { resource_ref: Some("fx/glow.webm".into()), ..Default::default() },
        );
        let off = profile.effects.add_with(
            LayerKind::Visual,
            &LayerPatch { resource_ref: Some("fx/smoke.webm".into()), ..Default::default() },
        );
        profile.effects.set_disabled(off, true);
        let pathless = profile.effects.add(LayerKind::Visual);
        let sound = profile.effects.add(LayerKind::Audio);

        let mut resolved = ResolvedRefs::new();
        resolved.insert("fx/glow.webm", Some("fx/glow.webm".into()));
        let out = compose(&PreviewInput {
            profile: &profile,
            resolved: &resolved,
            context: PreviewContext::default(),
        });
        let ids: Vec<LayerId> = out.effects_above.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![shown, off, pathless]);
        assert!(out.effects_above[0].style.is_some());
        assert_eq!(out.effects_above[0].locator.as_deref(), Some("fx/glow.webm"));
        assert!(out.effects_above[1].style.is_none());
        assert!(out.effects_above[2].style.is_none());
        assert_eq!(out.audio[0].id, sound);
        assert!(out.audio[0].style.is_none());
        assert_eq!(out.audio_set().count(), 0);
    }

    #[test]
    fn style_ignores_band() {
        let mut profile = AppearanceProfile::new("p");
        let patch = LayerPatch {
            resource_ref: Some("fx/a.webm".into()),
            rotation_degrees: Some(45.0),
            blend_mode: Some(BlendMode::Screen),
            ..Default::default()
        };
        profile.effects.add_with(LayerKind::Visual, &patch);
        let below = LayerPatch { band: Some(Band::Below), ..patch };
        profile.effects.add_with(LayerKind::Visual, &below);
        let out = compose_plain(&profile);
        assert_eq!(out.effects_above[0].style, out.effects_below[0].style);
        let css = out.effects_above[0].style.unwrap().css();
        assert!(css.contains("rotate(45deg)"));
        assert!(css.contains("mix-blend-mode: screen"));
    }

    #[test]
    fn compose_is_idempotent() {
        let mut profile = AppearanceProfile::new("p");
        profile.light.active = true;
        profile.ring.enabled = true;
        profile.effects.add(LayerKind::Visual);
        profile.effects.add(LayerKind::Audio);
        assert_eq!(compose_plain(&profile), compose_plain(&profile));
    }

    #[test]
    fn references_are_unique_and_non_empty() {
        let mut profile = AppearanceProfile::new("p");
        profile.changes.texture = Some("t.png".into());
        profile.changes.portrait = Some("t.png".into());
        profile.effects.add_with(
            LayerKind::Audio,
            &LayerPatch { resource_ref: Some("a.ogg".into()), ..Default::default() },
        );
        profile.effects.add(LayerKind::Visual);
        assert_eq!(references(&profile), vec!["t.png".to_string(), "a.ogg".to_string()]);
    }

    struct SwitchListing(Rc<Cell<bool>>);

    impl DirectoryListing for SwitchListing {
        fn browse(&self, _: SourceKind, dir: &str, _: &BrowseOptions) -> Result<Listing, ResolveError> {
            if !self.0.get() {
                return Err(ResolveError::listing(dir, "offline"));
            }
            Ok(Listing {
                files: vec!["amb1.ogg".into(), "amb2.ogg".into()],
            })
        }
    }

    #[test]
    fn unresolved_reference_retries_and_picks_stay_put() {
        let online = Rc::new(Cell::new(false));
        let mut resolver = ResourceResolver::with_seed(Box::new(SwitchListing(online.clone())), 3);
        let mut profile = AppearanceProfile::new("p");
        profile.effects.add_with(
            LayerKind::Audio,
            &LayerPatch { resource_ref: Some("amb*.ogg".into()), ..Default::default() },
        );
        let mut resolved = ResolvedRefs::new();

        assert!(!resolved.refresh(&profile, &mut resolver));
        assert_eq!(resolved.get("amb*.ogg"), None);

        online.set(true);
        assert!(resolved.refresh(&profile, &mut resolver));
        let pick = resolved.get("amb*.ogg").unwrap().to_string();
        assert!(pick == "amb1.ogg" || pick == "amb2.ogg");

        for _ in 0..5 {
            assert!(!resolved.refresh(&profile, &mut resolver));
            assert_eq!(resolved.locate("amb*.ogg").as_deref(), Some(pick.as_str()));
        }
    }
}
