use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use guise_types::{LayerKind, LayerPatch};

use crate::resolver::MAX_LOOKUP_DEPTH;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    preview: PreviewConfig,
    #[serde(default)]
    resolver: ResolverConfig,
    #[serde(default)]
    layers: LayersConfig,
}

#[derive(Deserialize, Default)]
struct PreviewConfig {
    range_debounce_ms: Option<u64>,
    text_debounce_ms: Option<u64>,
    grid_distance: Option<f32>,
}

#[derive(Deserialize, Default)]
struct ResolverConfig {
    max_lookup_depth: Option<usize>,
}

#[derive(Deserialize, Default)]
struct LayersConfig {
    visual_scale: Option<f32>,
    visual_opacity: Option<f32>,
    audio_volume: Option<f32>,
}

pub struct Config {
    preview: PreviewConfig,
    resolver: ResolverConfig,
    layers: LayersConfig,
}

impl Default for Config {
    /// Embedded defaults only, no user file.
    fn default() -> Self {
        let base = embedded();
        Config {
            preview: base.preview,
            resolver: base.resolver,
            layers: base.layers,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => {
                        if let Err(e) = config.merge_str(&contents) {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    }
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        config
    }

    /// Overlay the keys set in `contents` onto this config.
    pub fn merge_str(&mut self, contents: &str) -> Result<(), toml::de::Error> {
        let user: ConfigFile = toml::from_str(contents)?;
        merge_preview(&mut self.preview, user.preview);
        if user.resolver.max_lookup_depth.is_some() {
            self.resolver.max_lookup_depth = user.resolver.max_lookup_depth;
        }
        merge_layers(&mut self.layers, user.layers);
        Ok(())
    }

    /// Quiet period before a continuous range edit refreshes the preview.
    pub fn range_debounce(&self) -> Duration {
        Duration::from_millis(self.preview.range_debounce_ms.unwrap_or(50))
    }

    /// Quiet period before a text edit refreshes the preview.
    pub fn text_debounce(&self) -> Duration {
        Duration::from_millis(self.preview.text_debounce_ms.unwrap_or(200))
    }

    pub fn grid_distance(&self) -> f32 {
        self.preview
            .grid_distance
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(5.0)
    }

    /// Indirect lookup recursion bound (clamped to 1..=64).
    pub fn max_lookup_depth(&self) -> usize {
        self.resolver
            .max_lookup_depth
            .unwrap_or(MAX_LOOKUP_DEPTH)
            .clamp(1, 64)
    }

    /// Field values a freshly added layer starts with.
    pub fn layer_defaults(&self, kind: LayerKind) -> LayerPatch {
        match kind {
            LayerKind::Visual => LayerPatch {
                scale: Some(self.layers.visual_scale.unwrap_or(100.0)),
                opacity: Some(self.layers.visual_opacity.unwrap_or(1.0)),
                ..Default::default()
            },
            LayerKind::Audio => LayerPatch {
                opacity: Some(self.layers.audio_volume.unwrap_or(1.0)),
                ..Default::default()
            },
        }
    }
}

fn embedded() -> ConfigFile {
    toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
        log::error!(target: "config", "embedded config.toml is malformed: {}", e);
        ConfigFile::default()
    })
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("guise").join("config.toml"))
}

fn merge_preview(base: &mut PreviewConfig, user: PreviewConfig) {
    if user.range_debounce_ms.is_some() {
        base.range_debounce_ms = user.range_debounce_ms;
    }
    if user.text_debounce_ms.is_some() {
        base.text_debounce_ms = user.text_debounce_ms;
    }
    if user.grid_distance.is_some() {
        base.grid_distance = user.grid_distance;
    }
}

fn merge_layers(base: &mut LayersConfig, user: LayersConfig) {
    if user.visual_scale.is_some() {
        base.visual_scale = user.visual_scale;
    }
    if user.visual_opacity.is_some() {
        base.visual_opacity = user.visual_opacity;
    }
    if user.audio_volume.is_some() {
        base.audio_volume = user.audio_volume;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults() {
        let config = Config::default();
        assert_eq!(config.range_debounce(), Duration::from_millis(50));
        assert_eq!(config.text_debounce(), Duration::from_millis(200));
        assert_eq!(config.grid_distance(), 5.0);
        assert_eq!(config.max_lookup_depth(), 10);
    }

    #[test]
    fn user_keys_override_only_what_they_set() {
        let mut config = Config::default();
        config
            .merge_str("[preview]\ntext_debounce_ms = 350\n[layers]\naudio_volume = 0.25\n")
            .unwrap();
        assert_eq!(config.text_debounce(), Duration::from_millis(350));
        assert_eq!(config.range_debounce(), Duration::from_millis(50));
        assert_eq!(config.layer_defaults(LayerKind::Audio).opacity, Some(0.25));
        assert_eq!(config.layer_defaults(LayerKind::Visual).scale, Some(100.0));
    }

    #[test]
    fn malformed_user_config_is_rejected_without_damage() {
        let mut config = Config::default();
        assert!(config.merge_str("[preview\nbroken").is_err());
        assert_eq!(config.range_debounce(), Duration::from_millis(50));
    }

    #[test]
    fn nonsense_values_fall_back() {
        let mut config = Config::default();
        config
            .merge_str("[preview]\ngrid_distance = -2.0\n[resolver]\nmax_lookup_depth = 0\n")
            .unwrap();
        assert_eq!(config.grid_distance(), 5.0);
        assert_eq!(config.max_lookup_depth(), 1);
    }
}
