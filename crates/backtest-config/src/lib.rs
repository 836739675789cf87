//! Configuration management.
//!
//! Settings are read from a TOML file and overridden by `BACKTEST__`
//! environment variables, with `__` separating nested keys
//! (`BACKTEST__BACKTEST__INITIAL_CASH=5000`).

mod settings;

pub use settings::{AppConfig, AppSettings, DataSettings};

use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use thiserror::Error;

/// Failure to load, validate or render settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] backtest_core::ConfigError),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

fn environment() -> Environment {
    Environment::with_prefix("BACKTEST")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(environment())
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Parse configuration from a TOML string, without environment overrides.
pub fn load_config_str(toml: &str) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;

    Ok(config.try_deserialize()?)
}
