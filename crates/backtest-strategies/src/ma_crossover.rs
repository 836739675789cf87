//! Moving Average Crossover Strategy.
//!
//! Generates long signals when the fast MA crosses above the slow MA,
//! and exit (or short) signals when the fast MA crosses below the slow MA.

use serde::{Deserialize, Serialize};
use backtest_core::{
    error::ConfigError,
    traits::{Strategy, StrategyConfig},
    types::{IndicatorSpec, MarketView, Signal},
};

use crate::cross::{crossing, Cross};

/// Moving average flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
}

/// What a bearish event asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExitStyle {
    /// Close the long position
    #[default]
    Flat,
    /// Close and go short
    Reverse,
}

/// Configuration for the MA Crossover strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MACrossoverConfig {
    /// Fast moving average period
    pub fast_period: usize,
    /// Slow moving average period
    pub slow_period: usize,
    /// SMA or EMA
    pub ma_type: MaType,
    /// Flat or short on the downward cross
    pub exit: ExitStyle,
}

impl Default for MACrossoverConfig {
    fn default() -> Self {
        Self {
            fast_period: 20,
            slow_period: 50,
            ma_type: MaType::Sma,
            exit: ExitStyle::Flat,
        }
    }
}

impl StrategyConfig for MACrossoverConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_period == 0 {
            return Err(ConfigError::invalid("fast_period", "must be greater than 0"));
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

/// Moving Average Crossover Strategy.
#[derive(Debug, Clone)]
pub struct MACrossoverStrategy {
    config: MACrossoverConfig,
    fast: IndicatorSpec,
    slow: IndicatorSpec,
}

impl MACrossoverStrategy {
    /// Create a new MA Crossover strategy.
    pub fn new(config: MACrossoverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ma_type = config.ma_type;
        let spec = |period| match ma_type {
            MaType::Sma => IndicatorSpec::sma(period),
            MaType::Ema => IndicatorSpec::ema(period),
        };
        let fast = spec(config.fast_period);
        let slow = spec(config.slow_period);
        Ok(Self { config, fast, slow })
    }

    pub fn config(&self) -> &MACrossoverConfig {
        &self.config
    }
}

impl Strategy for MACrossoverStrategy {
    fn name(&self) -> &str {
        "MA Crossover"
    }

    fn description(&self) -> String {
        format!(
            "{:?}({}) / {:?}({}) crossover, exit {:?}",
            self.config.ma_type,
            self.config.fast_period,
            self.config.ma_type,
            self.config.slow_period,
            self.config.exit
        )
    }

    fn indicators(&self) -> Vec<IndicatorSpec> {
        vec![self.fast, self.slow]
    }

    fn warmup_period(&self) -> usize {
        self.config.slow_period + 1
    }

    fn decide(&self, view: &MarketView<'_>) -> Option<Signal> {
        if !self.is_warmed_up(view.len()) {
            return None;
        }

        let (prev_fast, fast) = view.last_two(&self.fast)?;
        let (prev_slow, slow) = view.last_two(&self.slow)?;
        let timestamp = view.timestamp();

        match crossing(prev_fast, prev_slow, fast, slow)? {
            Cross::Up => Some(Signal::long(timestamp).with_reason(format!(
                "Bullish crossover: fast MA ({:.2}) crossed above slow MA ({:.2})",
                fast, slow
            ))),
            Cross::Down => {
                let signal = match self.config.exit {
                    ExitStyle::Flat => Signal::flat(timestamp),
                    ExitStyle::Reverse => Signal::short(timestamp),
                };
                Some(signal.with_reason(format!(
                    "Bearish crossover: fast MA ({:.2}) crossed below slow MA ({:.2})",
                    fast, slow
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::decisions;
    use backtest_core::Direction;

    fn sma_config(fast: usize, slow: usize) -> MACrossoverConfig {
        MACrossoverConfig {
            fast_period: fast,
            slow_period: slow,
            ..Default::default()
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(MACrossoverConfig::default().validate().is_ok());
        assert!(sma_config(30, 20).validate().is_err());
        assert!(sma_config(20, 20).validate().is_err());
        assert!(sma_config(0, 20).validate().is_err());
        assert!(MACrossoverStrategy::new(sma_config(5, 3)).is_err());
    }

    #[test]
    fn test_hand_example_signals() {
        let strategy = MACrossoverStrategy::new(sma_config(3, 5)).unwrap();
        let closes = [10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0];
        let signals = decisions(&strategy, &closes);

        let events: Vec<(usize, Direction)> = signals
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s.direction)))
            .collect();

        // Downward cross at bar 5 (fast 10.0 < slow 10.6), upward cross at bar 8
        assert_eq!(events, vec![(5, Direction::Flat), (8, Direction::Long)]);
    }

    #[test]
    fn test_no_signal_during_warmup() {
        let strategy = MACrossoverStrategy::new(sma_config(3, 5)).unwrap();
        let signals = decisions(&strategy, &[5.0, 4.0, 3.0, 9.0, 12.0]);
        assert!(signals.iter().all(Option::is_none));
    }

    #[test]
    fn test_reverse_exit_goes_short() {
        let config = MACrossoverConfig {
            fast_period: 2,
            slow_period: 4,
            ma_type: MaType::Ema,
            exit: ExitStyle::Reverse,
        };
        let strategy = MACrossoverStrategy::new(config).unwrap();
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 10.0, 8.0, 6.0, 4.0];
        let signals = decisions(&strategy, &closes);

        let last = signals.iter().flatten().last().unwrap();
        assert_eq!(last.direction, Direction::Short);
    }

    #[test]
    fn test_indicators_follow_ma_type() {
        let config = MACrossoverConfig {
            ma_type: MaType::Ema,
            ..sma_config(5, 10)
        };
        let strategy = MACrossoverStrategy::new(config).unwrap();
        assert_eq!(
            strategy.indicators(),
            vec![IndicatorSpec::ema(5), IndicatorSpec::ema(10)]
        );
        assert_eq!(strategy.warmup_period(), 11);
    }
}
