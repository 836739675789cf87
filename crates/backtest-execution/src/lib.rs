//! Simulated order execution.
//!
//! The [`OrderExecutor`] turns an order into a fill against one bar, applying
//! the reference price, slippage and commission models and rejecting orders
//! the portfolio cannot honour. The [`PositionSizer`] decides how much to open.

mod executor;
mod models;
mod sizing;

pub use executor::{ExecutionConfig, OrderExecutor};
pub use models::{CommissionModel, ReferencePrice, SlippageModel};
pub use sizing::{PositionSizer, PositionSizing, SizingConfig};
