//! Configuration system for the NEUROFLAP trainer.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::error::{Error, Result};
use crate::neural::Topology;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub population: PopulationConfig,
    #[serde(default)]
    pub network: Topology,
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Population configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of units, fixed for the trainer's lifetime
    pub max_units: usize,
    /// Number of winners kept unchanged each generation
    pub top_units: usize,
}

/// Evolution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Per-gene mutation probability until the first bred generation
    pub initial_mutation_rate: f64,
    /// Per-gene mutation probability afterwards
    pub mutation_rate: f64,
}

/// Observation normalization and decision threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Both inputs are rescaled to `[-scale_factor, scale_factor]`
    pub scale_factor: f64,
    /// Horizontal distance clamp
    pub max_dx: f64,
    /// Vertical offset clamp
    pub max_dy: f64,
    /// The agent acts when the first output exceeds this value
    pub action_threshold: f64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Generations between recorded stats snapshots
    pub stats_interval: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            max_units: 10,
            top_units: 4,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            initial_mutation_rate: 1.0,
            mutation_rate: 0.2,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            scale_factor: 200.0,
            max_dx: 700.0,
            max_dy: 800.0,
            action_threshold: 0.5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 1,
        }
    }
}

impl Config {
    /// Default configuration with the given population sizes
    pub fn with_units(max_units: usize, top_units: usize) -> Self {
        Self {
            population: PopulationConfig {
                max_units,
                top_units,
            },
            ..Default::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// `top_units` larger than `max_units` is accepted here; the trainer
    /// clamps it.
    pub fn validate(&self) -> Result<()> {
        let population = &self.population;
        if population.max_units == 0 {
            return Err(Error::Configuration("max_units must be > 0".to_string()));
        }
        if population.top_units.min(population.max_units) < 2 {
            return Err(Error::Configuration(
                "top_units must be at least 2 (after clamping to max_units)".to_string(),
            ));
        }

        if self.network.n_inputs != 2 {
            return Err(Error::Configuration(format!(
                "network must have 2 inputs, got {}",
                self.network.n_inputs
            )));
        }
        if self.network.n_outputs == 0 {
            return Err(Error::Configuration("network needs at least one output".to_string()));
        }

        for (name, rate) in [
            ("initial_mutation_rate", self.evolution.initial_mutation_rate),
            ("mutation_rate", self.evolution.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::Configuration(format!("{name} must be within [0, 1], got {rate}")));
            }
        }

        let inputs = &self.inputs;
        if !inputs.scale_factor.is_finite() {
            return Err(Error::Configuration("scale_factor must be finite".to_string()));
        }
        if !(inputs.max_dx.is_finite() && inputs.max_dx > 0.0)
            || !(inputs.max_dy.is_finite() && inputs.max_dy > 0.0)
        {
            return Err(Error::Configuration("max_dx and max_dy must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population.max_units, 10);
        assert_eq!(config.network, Topology::default());
        assert_eq!(config.inputs.scale_factor, 200.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::with_units(12, 3);
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "population:\n  max_units: 20\n  top_units: 5\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.population.max_units, 20);
        assert_eq!(config.evolution, EvolutionConfig::default());
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            Config::with_units(0, 0).validate(),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Config::with_units(10, 1).validate(),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Config::with_units(1, 4).validate(),
            Err(Error::Configuration(_))
        ));
        // clamped to 3
        assert!(Config::with_units(3, 8).validate().is_ok());

        let mut config = Config::default();
        config.network.n_inputs = 3;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.evolution.mutation_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.inputs.scale_factor = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neuroflap.yaml");

        let mut config = Config::with_units(16, 6);
        config.logging.log_level = "debug".to_string();
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
