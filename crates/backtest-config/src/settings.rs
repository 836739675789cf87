//! Configuration structures.

use std::path::PathBuf;

use backtest_core::traits::DataRequest;
use backtest_core::{ConfigError, Timeframe};
use backtest_engine::{BacktestConfig, Backtester};
use backtest_monitor::LoggingOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SettingsError;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingOptions,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub data: DataSettings,
}

impl AppConfig {
    /// Check every section by building what it describes.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.data.validate()?;
        Backtester::new(self.backtest.clone())?;
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "backtester".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// CSV file, or directory of `SYMBOL[_TIMEFRAME].csv` files
    pub path: PathBuf,
    pub symbol: String,
    pub timeframe: Timeframe,
    /// RFC 3339, inclusive
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Lifetime of cached series
    pub cache_ttl_secs: u64,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            symbol: "SPY".to_string(),
            timeframe: Timeframe::Daily,
            start: None,
            end: None,
            cache_ttl_secs: 300,
        }
    }
}

impl DataSettings {
    pub fn request(&self) -> DataRequest {
        DataRequest {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            start: self.start,
            end: self.end,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::invalid("data.symbol", "must not be empty"));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ConfigError::invalid("data.start", "must not be after data.end"));
            }
        }
        Ok(())
    }
}
