//! Configuration loader and validator
//!
//! Loads tracker settings and controller model tables from TOML files in
//! the configs/ directory.

use super::table::{AxisNames, ControllerMapping};
use crate::device::constants::{CONTINUOUS_AXIS_THRESHOLD, DISCRETE_AXIS_THRESHOLD, DISCRETE_UPDATE_DELAY_MS};
use crate::device::TrackerSettings;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown controller model '{0}'")]
    UnknownModel(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Controller model tables
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Axis magnitude below which continuous-mode axes are ignored
    #[serde(default = "default_continuous_threshold")]
    pub continuous_threshold: f32,

    /// Axis magnitude below which discrete-mode axes are ignored
    #[serde(default = "default_discrete_threshold")]
    pub discrete_threshold: f32,

    /// Debounce window for discrete mode
    #[serde(default = "default_update_delay_ms")]
    pub update_delay_ms: u64,

    /// Mode given to devices as they connect
    #[serde(default = "default_true")]
    pub continuous_default: bool,

    /// Model used when none is requested explicitly
    #[serde(default = "default_model_name")]
    pub default_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            continuous_threshold: default_continuous_threshold(),
            discrete_threshold: default_discrete_threshold(),
            update_delay_ms: default_update_delay_ms(),
            continuous_default: true,
            default_model: default_model_name(),
        }
    }
}

fn default_continuous_threshold() -> f32 { CONTINUOUS_AXIS_THRESHOLD }
fn default_discrete_threshold() -> f32 { DISCRETE_AXIS_THRESHOLD }
fn default_update_delay_ms() -> u64 { DISCRETE_UPDATE_DELAY_MS }
fn default_true() -> bool { true }
fn default_model_name() -> String { "axis-t8311".to_string() }

impl Settings {
    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            continuous_threshold: self.continuous_threshold,
            discrete_threshold: self.discrete_threshold,
            update_delay: Duration::from_millis(self.update_delay_ms),
        }
    }
}

/// One controller model's table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub buttons: Vec<ButtonBinding>,

    /// Axis slot is the position in this list
    #[serde(default)]
    pub axes: Vec<AxisNames>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonBinding {
    pub slot: usize,
    pub name: String,
}

impl ModelConfig {
    pub fn to_mapping(&self) -> ControllerMapping {
        let buttons: HashMap<usize, String> = self
            .buttons
            .iter()
            .map(|b| (b.slot, b.name.clone()))
            .collect();
        ControllerMapping::new(self.name.clone(), buttons, self.axes.clone())
    }
}

impl Default for Config {
    /// Default settings with the built-in Axis T8311 table
    fn default() -> Self {
        let builtin = ControllerMapping::axis_t8311();
        let buttons = builtin
            .button_slots()
            .into_iter()
            .filter_map(|slot| {
                builtin.button_name(slot).map(|name| ButtonBinding {
                    slot,
                    name: name.to_string(),
                })
            })
            .collect();
        let axes = (0..builtin.axis_count())
            .filter_map(|slot| {
                let negative = builtin.axis_name(-1.0, slot)?;
                let positive = builtin.axis_name(1.0, slot)?;
                Some(AxisNames::new(negative, positive))
            })
            .collect();

        Self {
            settings: Settings::default(),
            models: vec![ModelConfig {
                name: builtin.name().to_string(),
                description: "Axis T8311 joystick".to_string(),
                buttons,
                axes,
            }],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        info!("Loading configuration from: {}", path_ref.display());

        let content = std::fs::read_to_string(path_ref)?;
        Self::from_toml(&content)
    }

    /// Load default configuration from configs/default.toml
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("configs/default.toml")
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;

        debug!("  - Models: {}", config.models.len());
        debug!("  - Default model: '{}'", config.settings.default_model);
        debug!(
            "  - Thresholds: continuous {} / discrete {}",
            config.settings.continuous_threshold, config.settings.discrete_threshold
        );

        config.validate()?;
        info!("✓ Config validation passed");

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.settings;
        if !(0.0..=1.0).contains(&settings.continuous_threshold) {
            return Err(ConfigError::Invalid(
                "continuous_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&settings.discrete_threshold) {
            return Err(ConfigError::Invalid(
                "discrete_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.models.is_empty() {
            return Err(ConfigError::Invalid(
                "At least one model is required".into(),
            ));
        }

        let mut names = HashSet::new();
        for model in &self.models {
            if !names.insert(model.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Model '{}' is defined more than once",
                    model.name
                )));
            }
            self.validate_model(model)?;
        }

        if !names.contains(settings.default_model.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Default model '{}' not found",
                settings.default_model
            )));
        }

        Ok(())
    }

    /// Validate a single model's slots and names
    fn validate_model(&self, model: &ModelConfig) -> Result<(), ConfigError> {
        if model.name.trim().is_empty() {
            return Err(ConfigError::Invalid("Model name must not be empty".into()));
        }

        let mut slots = HashSet::new();
        for binding in &model.buttons {
            if !slots.insert(binding.slot) {
                return Err(ConfigError::Invalid(format!(
                    "Model '{}' binds button slot {} more than once",
                    model.name, binding.slot
                )));
            }
            if binding.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Model '{}' button slot {} has an empty name",
                    model.name, binding.slot
                )));
            }
        }

        for (slot, axis) in model.axes.iter().enumerate() {
            if axis.negative.trim().is_empty() || axis.positive.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Model '{}' axis slot {} has an empty name",
                    model.name, slot
                )));
            }
        }

        Ok(())
    }

    /// Build the mapping table for a named model
    pub fn mapping(&self, model: &str) -> Result<ControllerMapping, ConfigError> {
        self.models
            .iter()
            .find(|m| m.name == model)
            .map(ModelConfig::to_mapping)
            .ok_or_else(|| ConfigError::UnknownModel(model.to_string()))
    }

    /// Mapping table for the configured default model
    pub fn default_mapping(&self) -> Result<ControllerMapping, ConfigError> {
        self.mapping(&self.settings.default_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> ModelConfig {
        ModelConfig {
            name: name.to_string(),
            description: "".to_string(),
            buttons: vec![ButtonBinding { slot: 0, name: "fire".to_string() }],
            axes: vec![AxisNames::new("left", "right")],
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.continuous_threshold, 0.05);
        assert_eq!(settings.discrete_threshold, 0.2);
        assert_eq!(settings.update_delay_ms, 350);
        assert!(settings.continuous_default);
        assert_eq!(settings.default_model, "axis-t8311");
        assert_eq!(settings.tracker_settings(), TrackerSettings::default());
    }

    #[test]
    fn test_default_config_matches_builtin() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_mapping().unwrap(), ControllerMapping::axis_t8311());
    }

    #[test]
    fn test_parse_minimal() {
        let config = Config::from_toml(
            r#"
            [settings]
            default_model = "pad"

            [[models]]
            name = "pad"
            buttons = [{ slot = 2, name = "jump" }]
            axes = [{ negative = "left", positive = "right" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.update_delay_ms, 350);
        let mapping = config.mapping("pad").unwrap();
        assert_eq!(mapping.button_name(2), Some("jump"));
        assert_eq!(mapping.axis_name(-0.4, 0), Some("left"));
    }

    #[test]
    fn test_parse_error() {
        let result = Config::from_toml("[settings\nbroken");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_thresholds() {
        let mut config = Config::default();
        config.settings.continuous_threshold = 1.5;
        assert!(config.validate().is_err());

        config.settings.continuous_threshold = 0.05;
        config.settings.discrete_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_models() {
        let config = Config {
            settings: Settings::default(),
            models: vec![],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_default_model() {
        let config = Config {
            settings: Settings {
                default_model: "nonexistent".to_string(),
                ..Settings::default()
            },
            models: vec![model("pad")],
        };

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_duplicate_model_names() {
        let config = Config {
            settings: Settings {
                default_model: "pad".to_string(),
                ..Settings::default()
            },
            models: vec![model("pad"), model("pad")],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_button_slot() {
        let mut pad = model("pad");
        pad.buttons.push(ButtonBinding { slot: 0, name: "other".to_string() });
        let config = Config {
            settings: Settings {
                default_model: "pad".to_string(),
                ..Settings::default()
            },
            models: vec![pad],
        };

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut pad = model("pad");
        pad.axes.push(AxisNames::new("", "down"));
        let config = Config {
            settings: Settings {
                default_model: "pad".to_string(),
                ..Settings::default()
            },
            models: vec![pad],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_model_lookup() {
        let config = Config::default();
        assert!(matches!(config.mapping("missing"), Err(ConfigError::UnknownModel(_))));
    }
}
