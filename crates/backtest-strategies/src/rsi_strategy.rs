//! RSI-based Trading Strategy.
//!
//! Trades RSI threshold crossings. In the mean-reversion framing it buys
//! when RSI crosses back above the oversold level and exits when RSI falls
//! back below the overbought level. The trend framing inverts this: buy on
//! a break above the upper level, exit on a break below the lower one.
//! The momentum framing waits for RSI to turn: long while oversold and
//! rising, exit while overbought and falling.

use serde::{Deserialize, Serialize};
use backtest_core::{
    error::ConfigError,
    traits::{Strategy, StrategyConfig},
    types::{IndicatorSpec, MarketView, RsiSmoothing, Signal},
};

use crate::cross::{cross_over, cross_under};

/// How threshold crossings are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RsiFraming {
    /// Long leaving oversold, exit leaving overbought
    #[default]
    MeanReversion,
    /// Long entering overbought, exit entering oversold
    Trend,
    /// Long while oversold and rising, exit while overbought and falling
    Momentum,
}

/// Configuration for the RSI strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    /// RSI calculation period
    pub period: usize,
    /// Oversold threshold
    pub lower: f64,
    /// Overbought threshold
    pub upper: f64,
    pub framing: RsiFraming,
    pub smoothing: RsiSmoothing,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            lower: 30.0,
            upper: 70.0,
            framing: RsiFraming::MeanReversion,
            smoothing: RsiSmoothing::Simple,
        }
    }
}

impl StrategyConfig for RsiConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.period == 0 {
            return Err(ConfigError::invalid("period", "must be greater than 0"));
        }
        if !(0.0..=100.0).contains(&self.lower) || !(0.0..=100.0).contains(&self.upper) {
            return Err(ConfigError::invalid(
                "lower",
                "RSI thresholds must be between 0 and 100",
            ));
        }
        if self.upper <= self.lower {
            return Err(ConfigError::invalid(
                "upper",
                format!("must be greater than lower ({} <= {})", self.upper, self.lower),
            ));
        }
        Ok(())
    }
}

/// RSI-based Trading Strategy.
#[derive(Debug, Clone)]
pub struct RsiStrategy {
    config: RsiConfig,
    rsi: IndicatorSpec,
}

impl RsiStrategy {
    /// Create a new RSI strategy.
    pub fn new(config: RsiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rsi = IndicatorSpec::Rsi {
            period: config.period,
            smoothing: config.smoothing,
        };
        Ok(Self { config, rsi })
    }

    /// Higher conviction at more extreme RSI readings.
    fn strength(rsi: f64) -> f64 {
        if rsi <= 20.0 || rsi >= 80.0 {
            0.9
        } else if rsi <= 30.0 || rsi >= 70.0 {
            0.7
        } else {
            0.5
        }
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "RSI Strategy"
    }

    fn description(&self) -> String {
        format!(
            "RSI({}) {:?} between {} and {}",
            self.config.period, self.config.framing, self.config.lower, self.config.upper
        )
    }

    fn indicators(&self) -> Vec<IndicatorSpec> {
        vec![self.rsi]
    }

    fn warmup_period(&self) -> usize {
        self.config.period + 2
    }

    fn decide(&self, view: &MarketView<'_>) -> Option<Signal> {
        if !self.is_warmed_up(view.len()) {
            return None;
        }

        let (prev, rsi) = view.last_two(&self.rsi)?;
        let RsiConfig { lower, upper, .. } = self.config;
        let timestamp = view.timestamp();

        let momentum = self.config.framing == RsiFraming::Momentum;
        let (enter_level, exit_level) = match self.config.framing {
            RsiFraming::Trend => (upper, lower),
            RsiFraming::MeanReversion | RsiFraming::Momentum => (lower, upper),
        };
        let (enter, exit) = if momentum {
            (rsi < lower && rsi > prev, rsi > upper && rsi < prev)
        } else {
            (cross_over(prev, rsi, enter_level), cross_under(prev, rsi, exit_level))
        };

        let reason = |up: bool| {
            if momentum {
                format!("RSI ({:.1}) turned {} from {:.1}", rsi, if up { "up" } else { "down" }, prev)
            } else {
                let (side, level) = if up { ("above", enter_level) } else { ("below", exit_level) };
                format!("RSI ({:.1}) crossed {} {:.1}", rsi, side, level)
            }
        };

        if enter {
            Some(
                Signal::long(timestamp)
                    .with_strength(Self::strength(prev))
                    .with_reason(reason(true)),
            )
        } else if exit {
            Some(
                Signal::flat(timestamp)
                    .with_strength(Self::strength(prev))
                    .with_reason(reason(false)),
            )
        } else {
            None
        }
    }
}
