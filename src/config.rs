//! Production configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

#[cfg(feature = "toml")]
use std::fs;
#[cfg(feature = "toml")]
use tracing::info;
#[cfg(feature = "toml")]
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Analytics pipeline defaults
    pub analytics: AnalyticsConfig,

    /// Alert thresholds
    pub alerts: AlertsConfig,

    /// Output configuration
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Trailing window for rolling statistics, in days
    pub volatility_window_days: i64,
    /// Z-score threshold for spike detection
    pub spike_z_threshold: f64,
    /// Future months to project in reports
    pub forecast_months: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub spike_z_threshold: f64,
    pub budget_variance_threshold_pct: f64,
    pub concentration_threshold_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub json_pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "ERROR".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
                directory: PathBuf::from("logs"),
            },
            analytics: AnalyticsConfig {
                volatility_window_days: 30,
                spike_z_threshold: 2.0,
                forecast_months: 3,
            },
            alerts: AlertsConfig {
                spike_z_threshold: 2.0,
                budget_variance_threshold_pct: 10.0,
                concentration_threshold_pct: 40.0,
            },
            output: OutputConfig { json_pretty: true },
        }
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        #[allow(unused_mut)]
        let mut config = Config::default();

        #[cfg(feature = "toml")]
        {
            let config_paths = [
                PathBuf::from("spendlens.toml"),
                PathBuf::from(".spendlens.toml"),
                dirs::config_dir()
                    .map(|d| d.join("spendlens").join("config.toml"))
                    .unwrap_or_default(),
            ];

            for path in &config_paths {
                if path.exists() {
                    info!(config_file = %path.display(), "Loading configuration from file");
                    config = Self::load_from_file(path)?;
                    break;
                }
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    #[cfg(feature = "toml")]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }
        if let Ok(val) = env::var("SPENDLENS_LOG_DIR") {
            self.logging.directory = PathBuf::from(val);
        }

        if let Ok(val) = env::var("SPENDLENS_VOLATILITY_WINDOW_DAYS") {
            self.analytics.volatility_window_days =
                val.parse().context("Invalid SPENDLENS_VOLATILITY_WINDOW_DAYS")?;
        }
        if let Ok(val) = env::var("SPENDLENS_SPIKE_Z_THRESHOLD") {
            self.analytics.spike_z_threshold =
                val.parse().context("Invalid SPENDLENS_SPIKE_Z_THRESHOLD")?;
        }
        if let Ok(val) = env::var("SPENDLENS_FORECAST_MONTHS") {
            self.analytics.forecast_months =
                val.parse().context("Invalid SPENDLENS_FORECAST_MONTHS")?;
        }

        if let Ok(val) = env::var("SPENDLENS_ALERT_BUDGET_VARIANCE_PCT") {
            self.alerts.budget_variance_threshold_pct =
                val.parse().context("Invalid SPENDLENS_ALERT_BUDGET_VARIANCE_PCT")?;
        }
        if let Ok(val) = env::var("SPENDLENS_ALERT_CONCENTRATION_PCT") {
            self.alerts.concentration_threshold_pct =
                val.parse().context("Invalid SPENDLENS_ALERT_CONCENTRATION_PCT")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.analytics.volatility_window_days <= 0 {
            return Err(anyhow::anyhow!(
                "Volatility window must be positive, got {} days",
                self.analytics.volatility_window_days
            ));
        }

        if self.analytics.spike_z_threshold <= 0.0 {
            return Err(anyhow::anyhow!(
                "Spike z-score threshold must be positive, got {}",
                self.analytics.spike_z_threshold
            ));
        }

        if self.analytics.forecast_months > 36 {
            return Err(anyhow::anyhow!(
                "Forecast horizon is capped at 36 months, got {}",
                self.analytics.forecast_months
            ));
        }

        if self.alerts.budget_variance_threshold_pct < 0.0
            || self.alerts.concentration_threshold_pct < 0.0
        {
            return Err(anyhow::anyhow!("Alert thresholds cannot be negative"));
        }

        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| Config::load().expect("Failed to load configuration"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "ERROR");
        assert_eq!(config.analytics.volatility_window_days, 30);
        assert_eq!(config.analytics.spike_z_threshold, 2.0);
        assert_eq!(config.alerts.concentration_threshold_pct, 40.0);
    }

    #[test]
    fn test_env_override() {
        env::set_var("SPENDLENS_VOLATILITY_WINDOW_DAYS", "45");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.analytics.volatility_window_days, 45);
        env::remove_var("SPENDLENS_VOLATILITY_WINDOW_DAYS");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.analytics.volatility_window_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analytics.spike_z_threshold = -1.0;
        assert!(config.validate().is_err());
    }
}
