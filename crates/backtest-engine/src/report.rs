//! Output of a completed run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use backtest_core::{PortfolioSnapshot, Timeframe, TradeRecord};

use crate::audit::AuditEvent;
use crate::metrics::Metrics;

/// Complete backtest report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Name of the strategy that ran
    pub strategy: String,
    /// One snapshot per bar, in order
    pub snapshots: Vec<PortfolioSnapshot>,
    /// Closed trades, in the order they closed
    pub trades: Vec<TradeRecord>,
    pub metrics: Metrics,
    /// Empty unless auditing was enabled
    pub audit: Vec<AuditEvent>,
    pub bars_processed: usize,
    pub rejected_orders: usize,
}

impl BacktestReport {
    /// Equity of the last snapshot.
    pub fn final_equity(&self) -> Option<Decimal> {
        self.snapshots.last().map(|s| s.equity)
    }

    /// Cash of the last snapshot.
    pub fn final_cash(&self) -> Option<Decimal> {
        self.snapshots.last().map(|s| s.cash)
    }

    /// `(timestamp, equity)` pairs.
    pub fn equity_curve(&self) -> Vec<(i64, Decimal)> {
        self.snapshots.iter().map(|s| (s.timestamp, s.equity)).collect()
    }

    /// Realized P&L over all closed trades.
    pub fn realized_pnl(&self) -> Decimal {
        self.trades.iter().map(|t| t.realized_pnl).sum()
    }
}
