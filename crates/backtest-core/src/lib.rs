//! Core types and traits for the backtesting engine.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries) and their validation
//! - Orders, fills, positions and the portfolio ledger
//! - Trading signals and the no-lookahead market view
//! - Core traits for strategies, indicators and data sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{BacktestError, BacktestResult, ConfigError, DataError, ExecutionRejection};
pub use types::*;
pub use traits::*;
