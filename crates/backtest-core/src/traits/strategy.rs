//! Strategy trait definitions.

use crate::error::ConfigError;
use crate::types::{IndicatorSpec, MarketView, Signal};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Core strategy trait.
///
/// A strategy maps the market as of one bar to an optional signal. It holds
/// only its construction-time parameters; everything it knows about the
/// market comes from the [`MarketView`], which never contains future bars.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Indicator series the engine must compute for this strategy.
    fn indicators(&self) -> Vec<IndicatorSpec>;

    /// Number of bars needed before the strategy can signal.
    fn warmup_period(&self) -> usize;

    /// Decide on the current bar.
    ///
    /// # Returns
    /// * `Some(Signal)` if the target exposure should change
    /// * `None` to hold
    fn decide(&self, view: &MarketView<'_>) -> Option<Signal>;

    /// Check if the strategy is warmed up (has enough data).
    fn is_warmed_up(&self, bars_available: usize) -> bool {
        bars_available >= self.warmup_period()
    }

    /// Get a description of the strategy.
    fn description(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle {
        warmup: usize,
    }

    impl Strategy for Idle {
        fn name(&self) -> &str {
            "idle"
        }

        fn indicators(&self) -> Vec<IndicatorSpec> {
            Vec::new()
        }

        fn warmup_period(&self) -> usize {
            self.warmup
        }

        fn decide(&self, _view: &MarketView<'_>) -> Option<Signal> {
            None
        }
    }

    #[test]
    fn test_strategy_warmup() {
        let strategy = Idle { warmup: 20 };

        assert!(!strategy.is_warmed_up(10));
        assert!(!strategy.is_warmed_up(19));
        assert!(strategy.is_warmed_up(20));
        assert!(strategy.is_warmed_up(100));
    }
}
