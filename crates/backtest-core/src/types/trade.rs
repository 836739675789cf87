//! Closed trades and per-bar portfolio snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of a position or closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> Decimal {
        match self {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => -Decimal::ONE,
        }
    }
}

/// One end of a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeLeg {
    /// Unix milliseconds
    pub timestamp: i64,
    pub price: Decimal,
    pub bar_index: usize,
}

/// A completed (or partially closed) round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: PositionSide,
    pub entry: TradeLeg,
    pub exit: TradeLeg,
    /// Closed quantity (always positive)
    pub quantity: Decimal,
    /// Entry and exit commissions attributed to the closed quantity
    pub commission: Decimal,
    /// Net of commission
    pub realized_pnl: Decimal,
}

impl TradeRecord {
    /// Check if the trade made money after costs.
    pub fn is_winner(&self) -> bool {
        self.realized_pnl > Decimal::ZERO
    }

    /// Number of bars the trade was held.
    pub fn holding_bars(&self) -> usize {
        self.exit.bar_index.saturating_sub(self.entry.bar_index)
    }
}

/// Position state captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    /// Signed quantity
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
    /// Price used for valuation (the bar's close)
    pub mark_price: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Portfolio state at the end of a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Unix milliseconds
    pub timestamp: i64,
    pub bar_index: usize,
    pub cash: Decimal,
    pub positions: Vec<PositionSnapshot>,
    /// cash + sum of position market values
    pub equity: Decimal,
}

impl PortfolioSnapshot {
    /// Check if any position was open at the snapshot.
    pub fn has_exposure(&self) -> bool {
        self.positions.iter().any(|p| !p.quantity.is_zero())
    }
}
