//! Parallel parameter sweeps.
//!
//! Each configuration gets its own [`Backtester`], so runs share nothing
//! but the read-only bar series.

use rayon::prelude::*;
use tracing::{info, warn};
use backtest_core::{BacktestError, BacktestResult, BarSeries};
use backtest_strategies::{ExitStyle, MACrossoverConfig, MaType, StrategySpec};

use crate::engine::{BacktestConfig, Backtester};
use crate::metrics::Metrics;
use crate::report::BacktestReport;

/// Result of one configuration in a sweep.
#[derive(Debug)]
pub struct SweepOutcome {
    pub label: String,
    pub config: BacktestConfig,
    pub result: BacktestResult<BacktestReport>,
}

impl SweepOutcome {
    pub fn metrics(&self) -> Option<&Metrics> {
        self.result.as_ref().ok().map(|r| &r.metrics)
    }
}

/// Runs many independent backtests on a rayon pool.
#[derive(Debug, Clone, Default)]
pub struct ParameterSweep {
    threads: Option<usize>,
}

impl ParameterSweep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a dedicated pool with `threads` workers instead of the global one.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// Run every configuration on `series`. Outcomes keep the input order.
    pub fn run(&self, series: &BarSeries, runs: Vec<(String, BacktestConfig)>) -> Vec<SweepOutcome> {
        info!(symbol = %series.symbol, runs = runs.len(), "Starting parameter sweep");

        let execute = || -> Vec<SweepOutcome> {
            runs.into_par_iter()
                .map(|(label, config)| {
                    let result = Backtester::new(config.clone())
                        .map_err(BacktestError::from)
                        .and_then(|mut backtester| backtester.run(series));
                    SweepOutcome {
                        label,
                        config,
                        result,
                    }
                })
                .collect()
        };

        match self.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(execute),
                Err(e) => {
                    warn!(error = %e, "Failed to build sweep thread pool, using the global pool");
                    execute()
                }
            },
            None => execute(),
        }
    }

    /// Outcome with the highest `score`, ignoring failed runs and NaN scores.
    pub fn best_by<'a, F>(outcomes: &'a [SweepOutcome], score: F) -> Option<&'a SweepOutcome>
    where
        F: Fn(&Metrics) -> f64,
    {
        outcomes
            .iter()
            .filter_map(|o| o.metrics().map(|m| (o, score(m))))
            .filter(|(_, s)| !s.is_nan())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(o, _)| o)
    }
}

/// Grid of moving-average crossover configurations.
#[derive(Debug, Clone)]
pub struct CrossoverGrid {
    pub fast_periods: Vec<usize>,
    pub slow_periods: Vec<usize>,
    pub ma_type: MaType,
    pub exit: ExitStyle,
}

impl CrossoverGrid {
    pub fn new(fast_periods: Vec<usize>, slow_periods: Vec<usize>) -> Self {
        Self {
            fast_periods,
            slow_periods,
            ma_type: MaType::Sma,
            exit: ExitStyle::Flat,
        }
    }

    pub fn with_ma_type(mut self, ma_type: MaType) -> Self {
        self.ma_type = ma_type;
        self
    }

    /// Labelled configurations derived from `base`, skipping fast >= slow.
    pub fn configs(&self, base: &BacktestConfig) -> Vec<(String, BacktestConfig)> {
        let prefix = match self.ma_type {
            MaType::Sma => "sma",
            MaType::Ema => "ema",
        };
        self.fast_periods
            .iter()
            .flat_map(|&fast| self.slow_periods.iter().map(move |&slow| (fast, slow)))
            .filter(|(fast, slow)| fast < slow)
            .map(|(fast, slow)| {
                let config = BacktestConfig {
                    strategy: StrategySpec::MaCrossover(MACrossoverConfig {
                        fast_period: fast,
                        slow_period: slow,
                        ma_type: self.ma_type,
                        exit: self.exit,
                    }),
                    ..base.clone()
                };
                (format!("{}_{}_{}", prefix, fast, slow), config)
            })
            .collect()
    }
}
