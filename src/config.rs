use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::mask::{MaskStyle, DEFAULT_NIGHT_ALPHA, DEFAULT_STRIDE};
use crate::paths;
use crate::scheduler::RefreshPolicy;

const CONFIG_FILE: &str = "config.toml";

/// Shortest accepted periodic refresh. Viewport changes still re-render
/// immediately; this only bounds the idle cadence.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 1_000;
/// Most opaque accepted night wash. Anything darker hides the map.
pub const MAX_NIGHT_ALPHA: u8 = 200;
/// Coarsest accepted sampling stride.
pub const MAX_SAMPLE_STRIDE: u32 = 16;

#[derive(Resource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub map: MapConfig,
    pub overlay: OverlayConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub default_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_latitude: constants::DEFAULT_LATITUDE,
            default_longitude: constants::DEFAULT_LONGITUDE,
            default_zoom: constants::DEFAULT_ZOOM,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    /// Attach the overlay at startup.
    pub enabled: bool,
    /// Idle refresh cadence, at least `MIN_REFRESH_INTERVAL_MS`.
    pub refresh_interval_ms: u64,
    /// Screen pixels between illumination samples.
    pub sample_stride: u32,
    /// Opacity of the night wash, 1..=`MAX_NIGHT_ALPHA`.
    pub night_alpha: u8,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_interval_ms: 60_000,
            sample_stride: DEFAULT_STRIDE,
            night_alpha: DEFAULT_NIGHT_ALPHA,
        }
    }
}

impl OverlayConfig {
    /// Clamp out-of-range values, logging each adjustment.
    pub fn validated(&self) -> Self {
        let mut out = self.clone();
        if out.refresh_interval_ms < MIN_REFRESH_INTERVAL_MS {
            warn!(
                "overlay.refresh_interval_ms {} below minimum, using {}",
                out.refresh_interval_ms, MIN_REFRESH_INTERVAL_MS
            );
            out.refresh_interval_ms = MIN_REFRESH_INTERVAL_MS;
        }
        if !(1..=MAX_SAMPLE_STRIDE).contains(&out.sample_stride) {
            let clamped = out.sample_stride.clamp(1, MAX_SAMPLE_STRIDE);
            warn!("overlay.sample_stride {} out of range, using {}", out.sample_stride, clamped);
            out.sample_stride = clamped;
        }
        if !(1..=MAX_NIGHT_ALPHA).contains(&out.night_alpha) {
            let clamped = out.night_alpha.clamp(1, MAX_NIGHT_ALPHA);
            warn!("overlay.night_alpha {} out of range, using {}", out.night_alpha, clamped);
            out.night_alpha = clamped;
        }
        out
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::from_millis(self.refresh_interval_ms)
    }

    pub fn mask_style(&self) -> MaskStyle {
        MaskStyle::new(self.sample_stride, self.night_alpha)
    }
}

impl AppConfig {
    fn validated(mut self) -> Self {
        self.overlay = self.overlay.validated();
        self
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(load_config());
    }
}

fn config_path() -> PathBuf {
    paths::config_dir().join(CONFIG_FILE)
}

pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str::<AppConfig>(contents).map(AppConfig::validated)
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

/// Read `path`, falling back to defaults. A missing file gets the defaults
/// written to it; a broken one is left alone.
pub fn load_config_from(path: &Path) -> AppConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match parse_config(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    warn!("Failed to parse config: {}, using defaults", e);
                }
            },
            Err(e) => {
                warn!("Failed to read config: {}, using defaults", e);
            }
        }
        return AppConfig::default();
    }

    let config = AppConfig::default();
    save_config_to(&config, path);
    config
}

fn save_config_to(config: &AppConfig, path: &Path) {
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            error!("Failed to create config directory {:?}: {}", dir, e);
            return;
        }
    }
    match toml::to_string_pretty(config) {
        Ok(contents) => {
            if let Err(e) = fs::write(path, contents) {
                error!("Failed to write config: {}", e);
            } else {
                info!("Saved config to {:?}", path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("daylight_map_config_{}_{}", name, std::process::id()))
            .join(CONFIG_FILE)
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.overlay.enabled);
        assert_eq!(config.overlay.refresh_interval_ms, 60_000);
        assert_eq!(config.overlay.sample_stride, 2);
        assert_eq!(config.overlay.night_alpha, 90);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config("[overlay]\nnight_alpha = 120\n").unwrap();
        assert_eq!(config.overlay.night_alpha, 120);
        assert_eq!(config.overlay.sample_stride, 2);
        assert_eq!(config.map, MapConfig::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = parse_config(
            "[overlay]\nrefresh_interval_ms = 5\nsample_stride = 0\nnight_alpha = 0\n",
        )
        .unwrap();
        assert_eq!(config.overlay.refresh_interval_ms, MIN_REFRESH_INTERVAL_MS);
        assert_eq!(config.overlay.sample_stride, 1);
        assert_eq!(config.overlay.night_alpha, 1);

        let config = parse_config("[overlay]\nsample_stride = 64\nnight_alpha = 255\n").unwrap();
        assert_eq!(config.overlay.sample_stride, MAX_SAMPLE_STRIDE);
        assert_eq!(config.overlay.night_alpha, MAX_NIGHT_ALPHA);

        let config = parse_config("[overlay]\nrefresh_interval_ms = 1000\nnight_alpha = 200\n").unwrap();
        assert_eq!(config.overlay.refresh_interval_ms, 1_000);
        assert_eq!(config.overlay.night_alpha, 200);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(parse_config("[overlay\nenabled = yes").is_err());
        assert!(parse_config("[overlay]\nnight_alpha = 300\n").is_err());
    }

    #[test]
    fn test_style_and_policy_from_config() {
        let overlay = OverlayConfig {
            enabled: true,
            refresh_interval_ms: 30_000,
            sample_stride: 4,
            night_alpha: 128,
        };
        assert_eq!(overlay.mask_style(), MaskStyle::new(4, 128));
        assert_eq!(
            overlay.refresh_policy().periodic_interval(),
            std::time::Duration::from_secs(30)
        );
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let path = temp_config("missing");
        let _ = fs::remove_file(&path);

        let config = load_config_from(&path);
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
        assert_eq!(load_config_from(&path), AppConfig::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_broken_file_is_not_overwritten() {
        let path = temp_config("broken");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not = [valid").unwrap();

        assert_eq!(load_config_from(&path), AppConfig::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "not = [valid");

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
