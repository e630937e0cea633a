use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::{MISSING_TOA_SENTINEL, SPEED_OF_SOUND_WATER};
use crate::density::ResidualModel;
use crate::validation::error::{ModelError, Result};

/// Model-wide settings that are fixed for a fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Sound speed in water (m/s)
    pub sound_speed_ms: f64,
    /// Raw arrival-time value that marks a missing detection in input rows
    pub missing_sentinel: f64,
    /// Distribution of arrival-time residuals
    pub residual_model: ResidualModel,
    /// Evaluate the likelihood passes concurrently
    pub parallel_passes: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            sound_speed_ms: SPEED_OF_SOUND_WATER,
            missing_sentinel: MISSING_TOA_SENTINEL,
            residual_model: ResidualModel::Gaussian,
            parallel_passes: false,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.sound_speed_ms.is_finite() || self.sound_speed_ms <= 0.0 {
            return Err(ModelError::InvalidSoundSpeed(self.sound_speed_ms));
        }
        if !self.missing_sentinel.is_finite() {
            return Err(ModelError::InvalidParameter {
                parameter: "missing_sentinel".to_string(),
                reason: format!("sentinel must be finite, got {}", self.missing_sentinel),
            });
        }
        if let ResidualModel::StudentMixture { log_scale, log_t_part, dof } = self.residual_model {
            if !log_scale.is_finite() {
                return Err(ModelError::InvalidParameter {
                    parameter: "residual_model.log_scale".to_string(),
                    reason: format!("must be finite, got {}", log_scale),
                });
            }
            // t_part is a mixture weight, so exp(log_t_part) must stay in (0, 1)
            if !log_t_part.is_finite() || log_t_part >= 0.0 {
                return Err(ModelError::InvalidParameter {
                    parameter: "residual_model.log_t_part".to_string(),
                    reason: format!("must be finite and negative, got {}", log_t_part),
                });
            }
            if !dof.is_finite() || dof <= 0.0 {
                return Err(ModelError::InvalidParameter {
                    parameter: "residual_model.dof".to_string(),
                    reason: format!("must be finite and positive, got {}", dof),
                });
            }
        }
        Ok(())
    }
}

/// Configuration manager with JSON persistence
pub struct ConfigurationManager {
    config: ModelConfig,
    /// Configuration file path
    config_file_path: Option<String>,
    /// Whether configuration has been modified since last load/save
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: ModelConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Replace the whole configuration after validating it
    pub fn update_config(&mut self, config: ModelConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file; missing fields take their defaults
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path)?;
        let config: ModelConfig = serde_json::from_str(&content)?;
        config.validate()?;

        debug!("loaded model configuration from '{}'", path_str);
        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config)?;
        fs::write(&path, content)?;

        debug!("saved model configuration to '{}'", path_str);
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<()> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ModelError::InvalidParameter {
                parameter: "config_file_path".to_string(),
                reason: "no file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Update sound speed, returning the previous value
    pub fn set_sound_speed(&mut self, sound_speed_ms: f64) -> Result<f64> {
        if !sound_speed_ms.is_finite() || sound_speed_ms <= 0.0 {
            return Err(ModelError::InvalidSoundSpeed(sound_speed_ms));
        }
        let old_value = self.config.sound_speed_ms;
        self.config.sound_speed_ms = sound_speed_ms;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn get_sound_speed(&self) -> f64 {
        self.config.sound_speed_ms
    }

    /// Switch the residual model, returning the previous one
    pub fn set_residual_model(&mut self, model: ResidualModel) -> Result<ResidualModel> {
        let candidate = ModelConfig { residual_model: model, ..self.config.clone() };
        candidate.validate()?;
        let old_model = self.config.residual_model;
        self.config = candidate;
        self.is_modified = true;
        Ok(old_model)
    }

    pub fn set_parallel_passes(&mut self, enabled: bool) -> bool {
        let old_value = self.config.parallel_passes;
        self.config.parallel_passes = enabled;
        self.is_modified = true;
        old_value
    }
}
