//! Configuration module
//!
//! Settings are read from a TOML file (default
//! `~/.config/invoice-billing/config.toml`). Every section has defaults,
//! so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::errors::ConfigError;
use crate::shared::retry::RetryConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invoice-billing")
        .join("config.toml")
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub billing: BillingConfig,
    pub simulator: SimulatorConfig,
}

impl AppConfig {
    /// Load and validate the config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.billing.schedule_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "billing.schedule_interval_secs must be greater than 0".into(),
            ));
        }
        if self.billing.max_concurrent_customers == 0 {
            return Err(ConfigError::Invalid(
                "billing.max_concurrent_customers must be greater than 0".into(),
            ));
        }
        if self.billing.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "billing.retry.max_attempts must be greater than 0".into(),
            ));
        }
        if self.billing.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "billing.retry.backoff_multiplier must be at least 1.0".into(),
            ));
        }
        for (name, rate) in [
            ("simulator.decline_rate", self.simulator.decline_rate),
            ("simulator.network_error_rate", self.simulator.network_error_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `invoice_billing=debug`. `RUST_LOG` wins.
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Billing run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Seconds between scheduled runs
    pub schedule_interval_secs: u64,
    /// Customers charged concurrently within one run
    pub max_concurrent_customers: usize,
    pub retry: RetrySettings,
}

impl BillingConfig {
    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs)
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            schedule_interval_secs: 10,
            max_concurrent_customers: 8,
            retry: RetrySettings::default(),
        }
    }
}

/// Retry policy for transient payment provider failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 10,
            backoff_multiplier: 2.0,
            max_delay_ms: 5000,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            backoff_multiplier: settings.backoff_multiplier,
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

/// Demo data and simulated payment provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub seed_customers: usize,
    pub invoices_per_customer: usize,
    /// Probability that a charge is declined
    pub decline_rate: f64,
    /// Probability that a single charge attempt fails on the network
    pub network_error_rate: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed_customers: 100,
            invoices_per_customer: 10,
            decline_rate: 0.1,
            network_error_rate: 0.2,
        }
    }
}
