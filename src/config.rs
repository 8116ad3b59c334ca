//! # Gateway Configuration
//!
//! YAML configuration for the gateway. Every field has a default, so an
//! empty document is a valid configuration:
//!
//! ```yaml
//! availability_timeout_secs: 3600
//! availability_check_interval_secs: 30
//! learning_minutes: 10
//! invalid_telegram_threshold: 5
//! profile_table: /etc/enocean/profiles.yaml
//! profile_overrides: /etc/enocean/overrides.yaml
//! device_store: /var/lib/enocean/devices.json
//! base_id: "ff:80:12:00"
//! ignore_directed_telegrams: true
//! ```

use crate::constants::{
    DEFAULT_AVAILABILITY_CHECK_INTERVAL, DEFAULT_AVAILABILITY_TIMEOUT,
    DEFAULT_INVALID_TELEGRAM_THRESHOLD, DEFAULT_LEARNING_MINUTES,
};
use crate::eep::{ProfileRegistry, RegistryBuilder};
use crate::error::EnOceanError;
use crate::telegram::DeviceAddress;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_availability_timeout() -> u64 {
    DEFAULT_AVAILABILITY_TIMEOUT.as_secs()
}

fn default_check_interval() -> u64 {
    DEFAULT_AVAILABILITY_CHECK_INTERVAL.as_secs()
}

fn default_learning_minutes() -> u64 {
    DEFAULT_LEARNING_MINUTES
}

fn default_invalid_threshold() -> u32 {
    DEFAULT_INVALID_TELEGRAM_THRESHOLD
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_availability_timeout")]
    pub availability_timeout_secs: u64,
    #[serde(default = "default_check_interval")]
    pub availability_check_interval_secs: u64,
    #[serde(default = "default_learning_minutes")]
    pub learning_minutes: u64,
    /// Consecutive invalid telegrams from one device before a dongle reset
    #[serde(default = "default_invalid_threshold")]
    pub invalid_telegram_threshold: u32,
    /// Profile table replacing the bundled catalogue
    #[serde(default)]
    pub profile_table: Option<PathBuf>,
    #[serde(default)]
    pub profile_overrides: Option<PathBuf>,
    #[serde(default)]
    pub device_store: Option<PathBuf>,
    /// Transceiver base ID used as sender of commands
    #[serde(default)]
    pub base_id: Option<DeviceAddress>,
    /// Skip telegrams addressed to a device other than this gateway
    #[serde(default = "default_true")]
    pub ignore_directed_telegrams: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            availability_timeout_secs: default_availability_timeout(),
            availability_check_interval_secs: default_check_interval(),
            learning_minutes: default_learning_minutes(),
            invalid_telegram_threshold: default_invalid_threshold(),
            profile_table: None,
            profile_overrides: None,
            device_store: None,
            base_id: None,
            ignore_directed_telegrams: true,
        }
    }
}

impl GatewayConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, EnOceanError> {
        // An empty document deserialises as unit, not as an empty map
        let config: GatewayConfig = if yaml.trim().is_empty() {
            GatewayConfig::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| EnOceanError::Config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EnOceanError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| EnOceanError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_yaml_str(&yaml)?;
        info!("Loaded gateway configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EnOceanError> {
        if self.availability_timeout_secs == 0 {
            return Err(EnOceanError::Config(
                "availability_timeout_secs must be positive".to_string(),
            ));
        }
        if self.availability_check_interval_secs == 0 {
            return Err(EnOceanError::Config(
                "availability_check_interval_secs must be positive".to_string(),
            ));
        }
        if self.invalid_telegram_threshold == 0 {
            return Err(EnOceanError::Config(
                "invalid_telegram_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn availability_timeout(&self) -> Duration {
        Duration::from_secs(self.availability_timeout_secs)
    }

    pub fn availability_check_interval(&self) -> Duration {
        Duration::from_secs(self.availability_check_interval_secs)
    }

    pub fn learning_duration(&self) -> Duration {
        Duration::from_secs(self.learning_minutes.saturating_mul(60))
    }

    /// Build the registry this configuration names: the bundled catalogue
    /// or `profile_table`, plus `profile_overrides`.
    pub fn build_registry(&self) -> Result<ProfileRegistry, EnOceanError> {
        let builder = match &self.profile_table {
            Some(path) => RegistryBuilder::default().table_file(path)?,
            None => RegistryBuilder::default().builtin()?,
        };
        let builder = match &self.profile_overrides {
            Some(path) => builder.overrides_file(path)?,
            None => builder,
        };
        builder.build()
    }
}
