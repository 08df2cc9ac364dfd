use serde::{Deserialize, Serialize};

use super::layer_store::LayerStore;
use super::light::LightProfile;
use super::ring::RingProfile;
use crate::ProfileId;

/// Identity profiles replace the base look; Overlay profiles stack on top.
/// Precedence is enforced by the downstream compositor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileMode {
    #[default]
    Identity,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    Secret,
    Hostile,
    Neutral,
    Friendly,
}

/// Normalized sprite anchor; (0.5, 0.5) is the center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const CENTER: Anchor = Anchor { x: 0.5, y: 0.5 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Free-form tags. Kept in entry order with their original case; a tag that
/// matches an existing one ignoring case is dropped at entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the tag was blank or already present.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains_ignore_case(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    /// Case-sensitive membership.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    fn contains_ignore_case(&self, tag: &str) -> bool {
        let lowered = tag.to_lowercase();
        self.0.iter().any(|t| t.to_lowercase() == lowered)
    }

    /// Parse a comma separated entry field.
    pub fn parse(text: &str) -> Self {
        text.split(',').collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for Tags {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

impl From<Vec<String>> for Tags {
    fn from(raw: Vec<String>) -> Self {
        raw.iter().map(String::as_str).collect()
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

/// Base-sprite overrides. `None` means "do not override"; every field is
/// always serialized, possibly as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub texture: Option<String>,
    pub scale: Option<f32>,
    pub mirror_x: Option<bool>,
    pub mirror_y: Option<bool>,
    pub alpha: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub lock_rotation: Option<bool>,
    pub disposition: Option<Disposition>,
    pub portrait: Option<String>,
    pub anchor: Option<Anchor>,
}

/// The authored bundle: overrides, effect layers, light and ring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceProfile {
    pub id: Option<ProfileId>,
    pub label: String,
    pub category: String,
    pub tags: Tags,
    pub mode: ProfileMode,
    pub changes: ProfileChanges,
    /// Milliseconds. Positive starts effects after the base change,
    /// negative before it.
    pub delay: i64,
    pub effects: LayerStore,
    pub light: LightProfile,
    pub ring: RingProfile,
}

impl AppearanceProfile {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_dedupe_ignoring_case_but_keep_original() {
        let mut tags = Tags::new();
        assert!(tags.insert("Fire"));
        assert!(!tags.insert("fire"));
        assert!(!tags.insert("  FIRE "));
        assert!(tags.insert("ice"));
        assert!(tags.contains("Fire"));
        assert!(!tags.contains("fire"));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["Fire", "ice"]);
    }

    #[test]
    fn tags_parse_comma_list() {
        let tags = Tags::parse("boss, Boss ,  ,undead");
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["boss", "undead"]);
    }

    #[test]
    fn payload_carries_every_override_as_null() {
        let profile = AppearanceProfile::new("Wolf form");
        let value = serde_json::to_value(&profile).unwrap();
        let changes = value["changes"].as_object().unwrap();
        assert_eq!(changes.len(), 12);
        assert!(changes.values().all(|v| v.is_null()));
        assert!(value["id"].is_null());
        assert!(value["effects"].as_array().unwrap().is_empty());
    }
}
