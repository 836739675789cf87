//! Incremental technical indicators.
//!
//! This crate provides the indicators used by the built-in strategies:
//! - Moving averages (SMA, EMA)
//! - Momentum indicators (RSI, MACD)
//!
//! Every indicator has an explicit state object that is updated in O(1) per
//! bar. Batch `calculate` folds that same state over a slice, so streaming and
//! batch results are identical. [`IndicatorBank`] streams a set of
//! [`IndicatorSpec`](backtest_core::IndicatorSpec)s bar by bar for the engine.

pub mod bank;
pub mod buffer;
pub mod momentum;
pub mod moving_average;

pub use bank::IndicatorBank;
pub use buffer::RingBuffer;
pub use momentum::{Macd, MacdOutput, MacdState, Rsi, RsiState};
pub use moving_average::{Ema, EmaState, Sma, SmaState};
