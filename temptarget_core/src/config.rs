//! Configuration file support for temptarget.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/temptarget/config.toml`.

use crate::{Error, GlucoseUnits, Result, Settings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub settings: LoopSettings,

    #[serde(default)]
    pub defaults: FormDefaults,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Settings shared with the dosing loop
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopSettings {
    #[serde(default = "default_units")]
    pub units: GlucoseUnits,

    /// Upper bound on the sensitivity ratio (autosens max)
    #[serde(default = "default_max_sensitivity_ratio")]
    pub max_sensitivity_ratio: f64,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            units: default_units(),
            max_sensitivity_ratio: default_max_sensitivity_ratio(),
        }
    }
}

/// Initial values for the percentage form
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormDefaults {
    #[serde(default = "default_half_basal_target")]
    pub half_basal_target: f64,

    #[serde(default = "default_percentage")]
    pub percentage: f64,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            half_basal_target: default_half_basal_target(),
            percentage: default_percentage(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(std::env::temp_dir)
        .join("temptarget")
}

fn default_units() -> GlucoseUnits {
    GlucoseUnits::MmolL
}

fn default_max_sensitivity_ratio() -> f64 {
    1.2
}

fn default_half_basal_target() -> f64 {
    crate::ratio::DEFAULT_HALF_BASAL_TARGET
}

fn default_percentage() -> f64 {
    crate::ratio::DEFAULT_PERCENTAGE
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(std::env::temp_dir)
            .join("temptarget")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.settings.max_sensitivity_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::Config(format!(
                "max_sensitivity_ratio must be a positive number, got {}",
                ratio
            )));
        }
        if !self.defaults.half_basal_target.is_finite() {
            return Err(Error::Config(
                "half_basal_target must be a finite number".into(),
            ));
        }
        Ok(())
    }

    /// Settings snapshot for the controller
    pub fn settings(&self) -> Settings {
        Settings {
            units: self.settings.units,
            max_sensitivity_ratio: self.settings.max_sensitivity_ratio,
        }
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
