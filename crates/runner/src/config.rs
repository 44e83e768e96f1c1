//! Service configuration, loaded from JSON with an embedded default.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hermes_engine::RiskLimits;
use hermes_gateway::RetryPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Shared secret expected on every webhook call
    pub webhook_token: String,
    /// Seconds inside which an identical alert fingerprint is a duplicate
    pub dedup_window_secs: u64,
    /// Dispatch queue depth; a full queue pushes back on the webhook
    pub queue_capacity: usize,
    pub risk: RiskConfig,
    pub retry: RetryConfig,
    pub simulation: SimulationSeed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub default_position_size_pct: Decimal,
    pub max_position_size_pct: Decimal,
    pub max_total_exposure_pct: Decimal,
    pub max_daily_loss: Decimal,
    pub quote_asset: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// Prices and balances seeded into the simulated exchange at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSeed {
    pub prices: BTreeMap<String, Decimal>,
    pub balances: BTreeMap<String, Decimal>,
}

impl ServiceConfig {
    pub fn risk_limits(&self) -> RiskLimits {
        RiskLimits {
            default_position_size_pct: self.risk.default_position_size_pct,
            max_position_size_pct: self.risk.max_position_size_pct,
            max_total_exposure_pct: self.risk.max_total_exposure_pct,
            max_daily_loss: self.risk.max_daily_loss,
            quote_asset: self.risk.quote_asset.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
        }
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook_token.trim().is_empty() {
            return Err(ConfigError::Invalid("webhook_token is empty".into()));
        }
        if self.dedup_window_secs == 0 {
            return Err(ConfigError::Invalid("dedup_window_secs must be > 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be > 0".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be > 0".into()));
        }
        for (name, value) in [
            (
                "risk.default_position_size_pct",
                self.risk.default_position_size_pct,
            ),
            ("risk.max_position_size_pct", self.risk.max_position_size_pct),
            (
                "risk.max_total_exposure_pct",
                self.risk.max_total_exposure_pct,
            ),
            ("risk.max_daily_loss", self.risk.max_daily_loss),
        ] {
            if value <= Decimal::ZERO {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Load configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string.
pub fn load_config_from_str(json: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load the default embedded configuration.
pub fn load_default_config() -> Result<ServiceConfig, ConfigError> {
    load_config_from_str(include_str!("service_config.json"))
}
