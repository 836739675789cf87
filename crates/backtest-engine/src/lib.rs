//! Backtesting engine.
//!
//! [`Backtester`] drives one strategy over one bar series and produces a
//! [`BacktestReport`] with snapshots, trades and [`Metrics`].
//! [`ParameterSweep`] runs many independent backtests in parallel.

mod audit;
mod engine;
mod metrics;
mod report;
mod sweep;

pub use audit::{AuditEvent, AuditLog};
pub use engine::{BacktestConfig, Backtester, RunState};
pub use metrics::{max_drawdown, Metrics, MetricsCalculator, MetricsConfig};
pub use report::BacktestReport;
pub use sweep::{CrossoverGrid, ParameterSweep, SweepOutcome};
