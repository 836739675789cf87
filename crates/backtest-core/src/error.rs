//! Error types for the backtesting engine.
//!
//! Data and configuration errors are fatal and propagate to the caller.
//! Execution rejections are recoverable: the engine drops the order and
//! carries on with the bar.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level backtest error.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Malformed, missing or out-of-order input data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Bar series for {symbol} is empty")]
    EmptySeries { symbol: String },

    #[error("Bar {index} (ts {timestamp}): timestamp is not after previous bar (ts {previous})")]
    NonMonotonicTimestamp {
        index: usize,
        timestamp: i64,
        previous: i64,
    },

    #[error("Bar {index} (ts {timestamp}): duplicate timestamp")]
    DuplicateTimestamp { index: usize, timestamp: i64 },

    #[error("Bar {index} (ts {timestamp}): invalid {field} value {value}")]
    InvalidField {
        index: usize,
        timestamp: i64,
        field: &'static str,
        value: f64,
    },

    #[error("Bar {index} (ts {timestamp}): {field} lies outside the bar's low/high range")]
    InconsistentRange {
        index: usize,
        timestamp: i64,
        field: &'static str,
    },

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

/// Invalid parameters, detected at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Strategy not found: {0}")]
    UnknownStrategy(String),

    #[error("Malformed strategy parameters: {0}")]
    MalformedParameters(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Reasons the order executor refuses an order.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionRejection {
    #[error("Insufficient cash: required {required}, available {available}")]
    InsufficientCash {
        required: Decimal,
        available: Decimal,
    },

    #[error("Short selling is disabled")]
    ShortingDisabled,

    #[error("Order quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    #[error("Limit price {limit} not reachable within bar range [{low}, {high}]")]
    LimitNotReached {
        limit: Decimal,
        low: Decimal,
        high: Decimal,
    },
}

/// Result type alias for engine operations.
pub type BacktestResult<T> = Result<T, BacktestError>;
