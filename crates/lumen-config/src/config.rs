//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level compositor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Bloom pyramid settings.
    pub bloom: BloomSettings,
    /// Color adjustments and tonemapping.
    pub color: ColorAdjustmentSettings,
    /// Pyramid storage and threading.
    pub render: RenderSettings,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Bloom settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomSettings {
    /// Brightness cutoff in gamma space.
    pub threshold: f32,
    /// Composite strength (0 = off).
    pub intensity: f32,
    /// Glow spread (0.0 - 1.0).
    pub scatter: f32,
    /// Maximum pixel intensity fed into the bloom.
    pub clamp: f32,
    /// Linear RGB tint.
    pub tint: [f32; 3],
    /// Maximum pyramid depth (1 - 16).
    pub max_iterations: u32,
    /// Bicubic instead of bilinear upsampling.
    pub high_quality_filtering: bool,
}

/// Tonemapping curve.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
pub enum Tonemapper {
    #[default]
    None,
    Neutral,
    Aces,
}

/// Color adjustment settings. Sliders are in `[-100, 100]`, 0 = unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorAdjustmentSettings {
    /// Skip grading entirely when false.
    pub enabled: bool,
    pub exposure: f32,
    pub contrast: f32,
    pub saturation: f32,
    /// Linear RGB multiplier.
    pub color_filter: [f32; 3],
    /// White balance temperature.
    pub temperature: f32,
    /// White balance green/magenta tint.
    pub tint: f32,
    pub tonemapping: Tonemapper,
}

/// Storage format of the pyramid images.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PyramidFormat {
    /// Full 32-bit float channels.
    Rgb32Float,
    /// Packed 11/11/10-bit unsigned floats.
    #[default]
    Rg11b10Float,
}

/// Render settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    pub pyramid_format: PyramidFormat,
    /// Image pool budget in MiB (0 = unlimited).
    pub pool_budget_mb: u64,
    /// Worker threads for per-pixel passes (0 = one per core).
    pub threads: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write a JSON log file even in release builds.
    pub log_to_file: bool,
}

// --- Default implementations ---

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 0.9,
            intensity: 1.0,
            scatter: 0.7,
            clamp: 65472.0,
            tint: [1.0, 1.0, 1.0],
            max_iterations: 6,
            high_quality_filtering: false,
        }
    }
}

impl Default for ColorAdjustmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            exposure: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            color_filter: [1.0, 1.0, 1.0],
            temperature: 0.0,
            tint: 0.0,
            tonemapping: Tonemapper::None,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            pyramid_format: PyramidFormat::Rg11b10Float,
            pool_budget_mb: 0,
            threads: 0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl RenderSettings {
    /// Pool budget in bytes, `None` when unlimited.
    pub fn pool_budget_bytes(&self) -> Option<u64> {
        (self.pool_budget_mb > 0).then(|| self.pool_budget_mb.saturating_mul(1024 * 1024))
    }
}

// --- Load / Save ---

impl Config {
    /// Path of the config file inside `config_dir`.
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = Self::path_in(config_dir);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = Self::path_in(config_dir);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let ron_str = std::fs::read_to_string(Config::path_in(dir.path())).unwrap();
        for key in ["threshold", "tonemapping", "pyramid_format", "log_level"] {
            assert!(ron_str.contains(key), "missing {key}");
        }
        // Section fields are written one per line.
        assert!(ron_str.lines().any(|line| line.trim_start().starts_with("threshold")));

        let parsed: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(parsed.bloom.threshold, 0.9);
        assert_eq!(parsed.color.tonemapping, Tonemapper::None);
        assert_eq!(parsed.render.pyramid_format, PyramidFormat::Rg11b10Float);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.bloom.tint = [1.0, 0.5, 0.25];
        config.color.tonemapping = Tonemapper::Aces;
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(bloom: (intensity: 2.5), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.bloom.intensity, 2.5);
        assert_eq!(config.bloom.scatter, 0.7);
        assert_eq!(config.color, ColorAdjustmentSettings::default());
        assert_eq!(config.render, RenderSettings::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(lens_flare: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_pool_budget_bytes() {
        let mut render = RenderSettings::default();
        assert_eq!(render.pool_budget_bytes(), None);
        render.pool_budget_mb = 3;
        assert_eq!(render.pool_budget_bytes(), Some(3 * 1024 * 1024));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.bloom.threshold = 1.2;
        config.render.threads = 2;
        config.debug.log_level = "debug".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("lumen");
        let config = Config::load_or_create(&nested).unwrap();
        assert_eq!(config, Config::default());
        assert!(Config::path_in(&nested).exists());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Config::path_in(dir.path()), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.ron"));
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// Lumen settings\n(\n  // bloom left at defaults\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
