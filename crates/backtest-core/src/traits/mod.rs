//! Core traits for the backtesting engine.

mod data_source;
mod indicator;
mod strategy;

pub use data_source::{DataRequest, DataSource};
pub use indicator::{Indicator, StreamingIndicator};
pub use strategy::{Strategy, StrategyConfig};
