//! MACD convergence strategy.
//!
//! Goes long when the trigger series (histogram, or the MACD line itself)
//! crosses zero upward and exits, or reverses, on the downward cross.

use serde::{Deserialize, Serialize};
use backtest_core::{
    error::ConfigError,
    traits::{Strategy, StrategyConfig},
    types::{IndicatorSpec, MacdComponent, MarketView, Signal},
};

use crate::cross::{crossing, Cross};
use crate::ma_crossover::ExitStyle;

/// Which MACD series is watched for zero crossings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MacdTrigger {
    /// MACD line crossing its signal line
    #[default]
    Histogram,
    /// MACD line crossing zero
    ZeroLine,
}

/// Configuration for the MACD strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    pub trigger: MacdTrigger,
    pub exit: ExitStyle,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            trigger: MacdTrigger::Histogram,
            exit: ExitStyle::Flat,
        }
    }
}

impl StrategyConfig for MacdConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_period == 0 {
            return Err(ConfigError::invalid("fast_period", "must be greater than 0"));
        }
        if self.signal_period == 0 {
            return Err(ConfigError::invalid("signal_period", "must be greater than 0"));
        }
        if self.fast_period >= self.slow_period {
            return Err(ConfigError::invalid(
                "fast_period",
                format!(
                    "must be less than slow_period ({} >= {})",
                    self.fast_period, self.slow_period
                ),
            ));
        }
        Ok(())
    }
}

/// MACD convergence strategy.
#[derive(Debug, Clone)]
pub struct MacdStrategy {
    config: MacdConfig,
    series: IndicatorSpec,
}

impl MacdStrategy {
    pub fn new(config: MacdConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let component = match config.trigger {
            MacdTrigger::Histogram => MacdComponent::Histogram,
            MacdTrigger::ZeroLine => MacdComponent::Line,
        };
        let series = IndicatorSpec::macd(
            config.fast_period,
            config.slow_period,
            config.signal_period,
            component,
        );
        Ok(Self { config, series })
    }
}

impl Strategy for MacdStrategy {
    fn name(&self) -> &str {
        "MACD"
    }

    fn description(&self) -> String {
        format!(
            "MACD({},{},{}) {:?} zero cross",
            self.config.fast_period,
            self.config.slow_period,
            self.config.signal_period,
            self.config.trigger
        )
    }

    fn indicators(&self) -> Vec<IndicatorSpec> {
        vec![self.series]
    }

    fn warmup_period(&self) -> usize {
        self.config.slow_period + self.config.signal_period
    }

    fn decide(&self, view: &MarketView<'_>) -> Option<Signal> {
        if !self.is_warmed_up(view.len()) {
            return None;
        }

        let (prev, value) = view.last_two(&self.series)?;
        let timestamp = view.timestamp();

        match crossing(prev, 0.0, value, 0.0)? {
            Cross::Up => Some(
                Signal::long(timestamp)
                    .with_reason(format!("{:?} crossed above zero ({:.4})", self.config.trigger, value)),
            ),
            Cross::Down => {
                let signal = match self.config.exit {
                    ExitStyle::Flat => Signal::flat(timestamp),
                    ExitStyle::Reverse => Signal::short(timestamp),
                };
                Some(signal.with_reason(format!(
                    "{:?} crossed below zero ({:.4})",
                    self.config.trigger, value
                )))
            }
        }
    }
}
