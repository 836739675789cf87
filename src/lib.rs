//! Event-driven backtesting of rule-based trading strategies.
//!
//! This crate re-exports the workspace crates and wires them together:
//! settings select a CSV data source and a strategy, and
//! [`run_with_settings`] produces a [`BacktestReport`].
//!
//! ```no_run
//! use std::path::Path;
//!
//! let settings = backtester::load_config(Path::new("config/default.toml"))?;
//! let report = backtester::run_with_settings(&settings)?;
//! println!("total return {:.2}%", report.metrics.total_return * 100.0);
//! # Ok::<(), backtester::RunError>(())
//! ```

pub use backtest_config as settings;
pub use backtest_core as model;
pub use backtest_data as data;
pub use backtest_engine as engine;
pub use backtest_execution as execution;
pub use backtest_indicators as indicators;
pub use backtest_monitor as monitor;
pub use backtest_strategies as strategies;

pub use backtest_config::{load_config, load_config_str, AppConfig, DataSettings, SettingsError};
pub use backtest_core::traits::{DataRequest, DataSource, Strategy};
pub use backtest_core::{BacktestError, Bar, BarSeries, Timeframe};
pub use backtest_data::{CachedDataSource, CsvDataSource};
pub use backtest_engine::{BacktestConfig, BacktestReport, Backtester, Metrics, ParameterSweep};
pub use backtest_monitor::{setup_logging, LoggingOptions};
pub use backtest_strategies::{StrategyRegistry, StrategySpec};

use std::time::Duration;

use thiserror::Error;
use tracing::info;

/// Failure of a configured run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Backtest(#[from] BacktestError),
}

impl From<backtest_core::DataError> for RunError {
    fn from(e: backtest_core::DataError) -> Self {
        RunError::Backtest(e.into())
    }
}

/// Validate `settings`, load bars from the configured CSV path and run.
///
/// Bars are read fresh on every call; use a [`Session`] to reuse them.
pub fn run_with_settings(settings: &AppConfig) -> Result<BacktestReport, RunError> {
    let source = CsvDataSource::new(&settings.data.path)?;
    run_with_source(settings, &source)
}

/// Cached CSV source kept across configured runs.
///
/// Runs that share a data request (strategy or cost variations on the same
/// symbol and range) load the file once per `data.cache_ttl_secs`.
#[derive(Debug)]
pub struct Session {
    source: CachedDataSource<CsvDataSource>,
}

impl Session {
    /// Open the CSV path from `data` behind a cache with its TTL.
    pub fn new(data: &DataSettings) -> Result<Self, RunError> {
        let ttl = Duration::from_secs(data.cache_ttl_secs);
        Ok(Self {
            source: backtest_data::cached_csv(&data.path, ttl)?,
        })
    }

    /// Validate `settings` and run on the session's cached bars.
    pub fn run(&self, settings: &AppConfig) -> Result<BacktestReport, RunError> {
        run_with_source(settings, &self.source)
    }

    pub fn source(&self) -> &CachedDataSource<CsvDataSource> {
        &self.source
    }
}

/// Validate `settings` and run on bars from `source`.
pub fn run_with_source(
    settings: &AppConfig,
    source: &dyn DataSource,
) -> Result<BacktestReport, RunError> {
    settings.validate()?;
    info!(
        app = %settings.app.name,
        source = source.name(),
        symbol = %settings.data.symbol,
        strategy = settings.backtest.strategy.id(),
        "Running configured backtest"
    );

    let mut backtester = Backtester::new(settings.backtest.clone()).map_err(BacktestError::from)?;
    Ok(backtester.run_source(source, &settings.data.request())?)
}
