//! Configuration file support for poolchem.
//!
//! Configuration is loaded from `$POOLCHEM_CONFIG` if set, otherwise from
//! `$XDG_CONFIG_HOME/poolchem/config.toml`. Missing files and missing keys
//! fall back to defaults.

use crate::balance::{InvalidInputPolicy, DEFAULT_TEMPERATURE_F};
use crate::calculator::DEFAULT_DRAIN_FRACTION;
use crate::planner::{DEFAULT_WAIT_HOURS, MAX_WAIT_HOURS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "POOLCHEM_CONFIG";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub dosing: DosingConfig,

    #[serde(default)]
    pub balance: BalanceConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// The pool being treated
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
    #[serde(default = "default_pool_type")]
    pub pool_type: String,

    #[serde(default = "default_volume_gallons")]
    pub volume_gallons: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_type: default_pool_type(),
            volume_gallons: default_volume_gallons(),
        }
    }
}

/// Dose calculation and scheduling
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DosingConfig {
    #[serde(default = "default_drain_fraction")]
    pub drain_fraction: f64,

    #[serde(default = "default_wait_hours")]
    pub default_wait_hours: u32,

    /// Per-product overrides of the built-in wait table
    #[serde(default)]
    pub wait_hours: HashMap<String, u32>,
}

impl Default for DosingConfig {
    fn default() -> Self {
        Self {
            drain_fraction: default_drain_fraction(),
            default_wait_hours: default_wait_hours(),
            wait_hours: HashMap::new(),
        }
    }
}

/// Water balance evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BalanceConfig {
    #[serde(default = "default_temperature_f")]
    pub default_temperature_f: f64,

    #[serde(default)]
    pub invalid_input: InvalidInputPolicy,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            default_temperature_f: default_temperature_f(),
            invalid_input: InvalidInputPolicy::default(),
        }
    }
}

/// External catalog files (JSON or TOML); unset means built-in
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct CatalogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_path: Option<PathBuf>,
}

// Default value functions
fn default_pool_type() -> String {
    crate::catalog::POOL_TYPE_CHLORINE.to_string()
}

fn default_volume_gallons() -> f64 {
    10_000.0
}

fn default_drain_fraction() -> f64 {
    DEFAULT_DRAIN_FRACTION
}

fn default_wait_hours() -> u32 {
    DEFAULT_WAIT_HOURS
}

fn default_temperature_f() -> f64 {
    DEFAULT_TEMPERATURE_F
}

impl Config {
    /// Load configuration from `$POOLCHEM_CONFIG` or the standard config path
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

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the config file path, honouring `$POOLCHEM_CONFIG`
    pub fn default_config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("poolchem").join("config.toml")
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.pool.pool_type.trim().is_empty() {
            return Err(Error::configuration("pool.pool_type must not be empty"));
        }
        if !(self.pool.volume_gallons.is_finite() && self.pool.volume_gallons > 0.0) {
            return Err(Error::configuration(format!(
                "pool.volume_gallons must be positive, got {}",
                self.pool.volume_gallons
            )));
        }
        if !(self.dosing.drain_fraction > 0.0 && self.dosing.drain_fraction <= 1.0) {
            return Err(Error::configuration(format!(
                "dosing.drain_fraction must be in (0, 1], got {}",
                self.dosing.drain_fraction
            )));
        }
        if self.dosing.default_wait_hours > MAX_WAIT_HOURS {
            return Err(Error::configuration(format!(
                "dosing.default_wait_hours must be at most {}, got {}",
                MAX_WAIT_HOURS, self.dosing.default_wait_hours
            )));
        }
        if let Some((product, hours)) = self
            .dosing
            .wait_hours
            .iter()
            .find(|(_, hours)| **hours > MAX_WAIT_HOURS)
        {
            return Err(Error::configuration(format!(
                "dosing.wait_hours.{} must be at most {}, got {}",
                product, MAX_WAIT_HOURS, hours
            )));
        }
        if !self.balance.default_temperature_f.is_finite() {
            return Err(Error::configuration(
                "balance.default_temperature_f must be a finite number",
            ));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pool.pool_type, "chlorine");
        assert_eq!(config.pool.volume_gallons, 10_000.0);
        assert_eq!(config.dosing.drain_fraction, 0.25);
        assert_eq!(config.dosing.default_wait_hours, 4);
        assert_eq!(config.balance.default_temperature_f, 78.0);
        assert_eq!(config.balance.invalid_input, InvalidInputPolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[pool]
pool_type = "saltwater"

[dosing.wait_hours]
salt = 12

[balance]
invalid_input = "clamp"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pool.pool_type, "saltwater");
        assert_eq!(config.pool.volume_gallons, 10_000.0); // default
        assert_eq!(config.dosing.wait_hours.get("salt"), Some(&12));
        assert_eq!(config.balance.invalid_input, InvalidInputPolicy::Clamp);
        assert!(config.catalog.parameters_path.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.pool.volume_gallons = 18_000.0;
        config.dosing.wait_hours.insert("muriatic_acid".into(), 6);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_drain_fraction_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[dosing]\ndrain_fraction = 1.5\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_excessive_wait_hours_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[dosing.wait_hours]\nph_increaser = 4294967295\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref msg) if msg.contains("ph_increaser")));

        let mut config = Config::default();
        config.dosing.default_wait_hours = MAX_WAIT_HOURS + 1;
        assert!(config.validate().is_err());
        config.dosing.default_wait_hours = MAX_WAIT_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_volume_rejected() {
        let mut config = Config::default();
        config.pool.volume_gallons = 0.0;
        assert!(config.validate().is_err());
    }
}
