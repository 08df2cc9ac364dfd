use serde::{Deserialize, Serialize};

use crate::Rgb;

/// Cosmetic ring sub-effects, each toggled on its own.
///
/// Stored as a bit mask: `ENABLED` is always written and ignored on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct RingEffects {
    pub pulse: bool,
    pub gradient: bool,
    pub wave: bool,
    pub invisibility: bool,
}

impl RingEffects {
    pub const ENABLED: u32 = 0x01;
    pub const PULSE: u32 = 0x02;
    pub const GRADIENT: u32 = 0x04;
    pub const WAVE: u32 = 0x08;
    pub const INVISIBILITY: u32 = 0x10;

    pub fn from_bits(bits: u32) -> Self {
        Self {
            pulse: bits & Self::PULSE != 0,
            gradient: bits & Self::GRADIENT != 0,
            wave: bits & Self::WAVE != 0,
            invisibility: bits & Self::INVISIBILITY != 0,
        }
    }

    pub fn bits(&self) -> u32 {
        let mut bits = Self::ENABLED;
        if self.pulse {
            bits |= Self::PULSE;
        }
        if self.gradient {
            bits |= Self::GRADIENT;
        }
        if self.wave {
            bits |= Self::WAVE;
        }
        if self.invisibility {
            bits |= Self::INVISIBILITY;
        }
        bits
    }

    pub fn get(&self, flag: RingEffect) -> bool {
        match flag {
            RingEffect::Pulse => self.pulse,
            RingEffect::Gradient => self.gradient,
            RingEffect::Wave => self.wave,
            RingEffect::Invisibility => self.invisibility,
        }
    }

    pub fn set(&mut self, flag: RingEffect, on: bool) {
        match flag {
            RingEffect::Pulse => self.pulse = on,
            RingEffect::Gradient => self.gradient = on,
            RingEffect::Wave => self.wave = on,
            RingEffect::Invisibility => self.invisibility = on,
        }
    }
}

impl From<u32> for RingEffects {
    fn from(bits: u32) -> Self {
        Self::from_bits(bits)
    }
}

impl From<RingEffects> for u32 {
    fn from(effects: RingEffects) -> Self {
        effects.bits()
    }
}

/// Names one ring sub-effect; used as a field key by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RingEffect {
    Pulse,
    Gradient,
    Wave,
    Invisibility,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingColors {
    pub ring: Option<Rgb>,
    pub background: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSubject {
    #[serde(default)]
    pub resource_ref: String,
    /// Multiplier applied on top of the profile's own scale.
    pub scale: f32,
}

impl Default for RingSubject {
    fn default() -> Self {
        Self {
            resource_ref: String::new(),
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingProfile {
    pub enabled: bool,
    pub colors: RingColors,
    pub subject: RingSubject,
    pub effects: RingEffects,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_bits_ignore_enabled_on_read() {
        let effects = RingEffects::from_bits(RingEffects::ENABLED | RingEffects::WAVE);
        assert!(effects.wave);
        assert!(!effects.pulse);
        assert_eq!(effects.bits(), RingEffects::ENABLED | RingEffects::WAVE);
    }

    #[test]
    fn effects_serialize_as_mask() {
        let mut effects = RingEffects::default();
        effects.set(RingEffect::Pulse, true);
        effects.set(RingEffect::Invisibility, true);
        let json = serde_json::to_string(&effects).unwrap();
        assert_eq!(json, "19");
        let back: RingEffects = serde_json::from_str(&json).unwrap();
        assert!(back.get(RingEffect::Pulse));
        assert!(back.get(RingEffect::Invisibility));
        assert!(!back.get(RingEffect::Gradient));
    }
}
