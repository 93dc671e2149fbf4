//! Application settings, read from `fitsview.toml`.

use crate::model::{Stretch, TapLayout};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "fitsview.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub display: DisplayConfig,
    pub watch: WatchConfig,
    pub taps: TapConfig,
    pub viewfinder: ViewfinderConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig { width: 1280.0, height: 800.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub stretch: Stretch,
    /// Contrast slider position, 0..=100; 50 leaves the image unchanged.
    pub contrast: u8,
    pub histogram_bins: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig { stretch: Stretch::Linear, contrast: 50, histogram_bins: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig { poll_interval_ms: 1000 }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    pub tap_width: usize,
    pub num_taps: usize,
}

impl Default for TapConfig {
    fn default() -> Self {
        let layout = TapLayout::default();
        TapConfig { tap_width: layout.tap_width, num_taps: layout.num_taps }
    }
}

impl TapConfig {
    pub fn layout(&self) -> TapLayout {
        TapLayout { tap_width: self.tap_width, num_taps: self.num_taps }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewfinderConfig {
    pub size: usize,
}

impl Default for ViewfinderConfig {
    fn default() -> Self {
        ViewfinderConfig { size: 200 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Load from `path`, or from `fitsview.toml` in the working directory if it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                    return Ok(Config::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path: path.clone(), source },
            other => other,
        })?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)
            .map_err(|source| ConfigError::Parse { path: PathBuf::new(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Invalid { message: message.to_string() });
        if self.taps.tap_width == 0 || self.taps.tap_width % 2 != 0 {
            return invalid("taps.tap_width must be a positive even number");
        }
        if self.taps.num_taps == 0 {
            return invalid("taps.num_taps must be positive");
        }
        if !(1..=256).contains(&self.display.histogram_bins) {
            return invalid("display.histogram_bins must be within 1..=256");
        }
        if self.display.contrast > 100 {
            return invalid("display.contrast must be within 0..=100");
        }
        if self.viewfinder.size == 0 {
            return invalid("viewfinder.size must be positive");
        }
        if self.watch.poll_interval_ms == 0 {
            return invalid("watch.poll_interval_ms must be positive");
        }
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return invalid("window size must be positive");
        }
        Ok(())
    }
}
