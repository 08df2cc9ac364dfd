use serde::{Deserialize, Serialize};

use crate::Rgb;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightAnimationKind {
    #[default]
    None,
    Torch,
    Pulse,
    Chroma,
    Wave,
    Fog,
    Sunburst,
    Flame,
}

impl LightAnimationKind {
    pub fn name(&self) -> &'static str {
        match self {
            LightAnimationKind::None => "None",
            LightAnimationKind::Torch => "Torch",
            LightAnimationKind::Pulse => "Pulse",
            LightAnimationKind::Chroma => "Chroma",
            LightAnimationKind::Wave => "Wave",
            LightAnimationKind::Fog => "Fog",
            LightAnimationKind::Sunburst => "Sunburst",
            LightAnimationKind::Flame => "Flame",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, LightAnimationKind::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightAnimation {
    #[serde(default)]
    pub kind: LightAnimationKind,
    /// 1..=10
    pub speed: u8,
    /// 1..=10
    pub intensity: u8,
}

impl Default for LightAnimation {
    fn default() -> Self {
        Self {
            kind: LightAnimationKind::None,
            speed: 5,
            intensity: 5,
        }
    }
}

impl LightAnimation {
    pub fn set_speed(&mut self, speed: u8) {
        self.speed = speed.clamp(1, 10);
    }

    pub fn set_intensity(&mut self, intensity: u8) {
        self.intensity = intensity.clamp(1, 10);
    }
}

/// Ambient light emitted by the actor.
///
/// `bright <= dim` is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightProfile {
    pub active: bool,
    pub dim: f32,
    pub bright: f32,
    pub color: Rgb,
    pub alpha: f32,
    pub angle: f32,
    /// Negative values emit darkness.
    pub luminosity: f32,
    pub priority: i32,
    pub animation: LightAnimation,
}

impl Default for LightProfile {
    fn default() -> Self {
        Self {
            active: false,
            dim: 0.0,
            bright: 0.0,
            color: Rgb::WHITE,
            alpha: 0.5,
            angle: 360.0,
            luminosity: 0.5,
            priority: 0,
            animation: LightAnimation::default(),
        }
    }
}

impl LightProfile {
    pub fn set_dim(&mut self, dim: f32) {
        self.dim = dim.max(0.0);
    }

    pub fn set_bright(&mut self, bright: f32) {
        self.bright = bright.max(0.0);
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle.clamp(0.0, 360.0);
    }

    pub fn set_luminosity(&mut self, luminosity: f32) {
        self.luminosity = luminosity.clamp(-1.0, 1.0);
    }

    pub fn is_darkness(&self) -> bool {
        self.luminosity < 0.0
    }

    /// Outer radius of the light, in grid distance units.
    pub fn radius(&self) -> f32 {
        self.dim.max(self.bright)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_ranges() {
        let mut light = LightProfile::default();
        light.set_dim(-4.0);
        light.set_alpha(1.5);
        light.set_angle(720.0);
        light.set_luminosity(-3.0);
        light.animation.set_speed(0);
        light.animation.set_intensity(42);
        assert_eq!(light.dim, 0.0);
        assert_eq!(light.alpha, 1.0);
        assert_eq!(light.angle, 360.0);
        assert_eq!(light.luminosity, -1.0);
        assert!(light.is_darkness());
        assert_eq!(light.animation.speed, 1);
        assert_eq!(light.animation.intensity, 10);
    }

    #[test]
    fn defaults_match_editor_expectations() {
        let light = LightProfile::default();
        assert_eq!(light.dim, 0.0);
        assert_eq!(light.bright, 0.0);
        assert_eq!(light.angle, 360.0);
        assert_eq!(light.animation.speed, 5);
        assert_eq!(light.animation.intensity, 5);
        assert!(light.animation.kind.is_none());
    }
}
