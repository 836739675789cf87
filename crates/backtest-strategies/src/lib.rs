//! Trading strategy implementations.
//!
//! This crate provides the built-in rule-based strategies:
//! - Moving Average Crossover
//! - RSI threshold oscillator
//! - MACD convergence
//! - Composite (agreement across several strategies)
//!
//! Strategies are described by a serde-tagged [`StrategySpec`] and built into
//! `Box<dyn Strategy>`; [`StrategyRegistry`] lists them with their defaults.

mod composite;
mod convergence;
mod cross;
mod ma_crossover;
mod registry;
mod rsi_strategy;

pub use composite::{AgreementRule, CompositeConfig, CompositeStrategy};
pub use convergence::{MacdConfig, MacdStrategy, MacdTrigger};
pub use cross::{cross_over, cross_under, crossing, Cross};
pub use ma_crossover::{ExitStyle, MACrossoverConfig, MACrossoverStrategy, MaType};
pub use registry::{StrategyInfo, StrategyRegistry, StrategySpec};
pub use rsi_strategy::{RsiConfig, RsiFraming, RsiStrategy};

#[cfg(test)]
mod test_support;
