//! Position and portfolio types.
//!
//! The portfolio is the cash and position ledger of a single run. It only
//! changes through [`Portfolio::apply`] (fills) and records one snapshot per
//! bar through [`Portfolio::mark_to_market`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Bar, Fill, PortfolioSnapshot, PositionSide, PositionSnapshot, TradeLeg, TradeRecord};

/// An open position in a single security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Symbol
    pub symbol: String,
    /// Number of units (positive for long, negative for short)
    pub quantity: Decimal,
    /// Weighted average entry price
    pub avg_entry_price: Decimal,
    /// Entry commission not yet attributed to a closed trade
    pub entry_commission: Decimal,
    /// Timestamp of the fill that opened the position
    pub opened_at: i64,
    /// Bar index of the fill that opened the position
    pub opened_bar: usize,
    /// Last price used for valuation
    pub last_price: Decimal,
}

impl Position {
    /// Open a position from a fill.
    fn open(fill: &Fill, quantity: Decimal, commission: Decimal) -> Self {
        Self {
            symbol: fill.symbol.clone(),
            quantity,
            avg_entry_price: fill.price,
            entry_commission: commission,
            opened_at: fill.timestamp,
            opened_bar: fill.bar_index,
            last_price: fill.price,
        }
    }

    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    /// Check if this is a short position.
    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    /// Check if the position is flat (no units).
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Side of the position. Flat positions report long.
    pub fn side(&self) -> PositionSide {
        if self.is_short() {
            PositionSide::Short
        } else {
            PositionSide::Long
        }
    }

    /// Market value at the last price (negative for shorts).
    pub fn market_value(&self) -> Decimal {
        self.quantity * self.last_price
    }

    /// Unrealized profit/loss at the last price, before commissions.
    pub fn unrealized_pnl(&self) -> Decimal {
        (self.last_price - self.avg_entry_price) * self.quantity
    }

    fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            symbol: self.symbol.clone(),
            quantity: self.quantity,
            avg_entry_price: self.avg_entry_price,
            mark_price: self.last_price,
            market_value: self.market_value(),
            unrealized_pnl: self.unrealized_pnl(),
        }
    }
}

/// Portfolio containing cash, open positions, closed trades and the
/// per-bar equity history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    initial_cash: Decimal,
    cash: Decimal,
    positions: BTreeMap<String, Position>,
    trades: Vec<TradeRecord>,
    history: Vec<PortfolioSnapshot>,
}

impl Portfolio {
    /// Create a new portfolio with initial cash.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Starting cash.
    pub fn initial_cash(&self) -> Decimal {
        self.initial_cash
    }

    /// Available cash.
    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Get a position by symbol.
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Signed quantity held in a symbol (zero when flat).
    pub fn quantity(&self, symbol: &str) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Iterate over open positions in symbol order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Closed trades in the order they were closed.
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// One snapshot per marked bar.
    pub fn history(&self) -> &[PortfolioSnapshot] {
        &self.history
    }

    /// Equity at the last valuation prices.
    pub fn equity(&self) -> Decimal {
        self.cash + self.positions.values().map(Position::market_value).sum::<Decimal>()
    }

    /// Consume the portfolio, returning its snapshots and trades.
    pub fn into_parts(self) -> (Vec<PortfolioSnapshot>, Vec<TradeRecord>) {
        (self.history, self.trades)
    }

    /// Apply a fill to cash and positions.
    ///
    /// Buys debit `price * quantity + commission`, sells credit
    /// `price * quantity - commission`. Fills that reduce, close or reverse a
    /// position produce a [`TradeRecord`] for the closed quantity, with the
    /// proportional share of entry and exit commission deducted from its P&L.
    pub fn apply(&mut self, fill: &Fill) -> Option<TradeRecord> {
        self.cash += fill.cash_delta();

        let signed = fill.side.sign() * fill.quantity;

        let Some(position) = self.positions.get_mut(&fill.symbol) else {
            self.positions.insert(
                fill.symbol.clone(),
                Position::open(fill, signed, fill.commission),
            );
            return None;
        };

        let same_direction = (position.quantity > Decimal::ZERO && signed > Decimal::ZERO)
            || (position.quantity < Decimal::ZERO && signed < Decimal::ZERO);

        if same_direction {
            let held = position.quantity.abs();
            let total_cost = held * position.avg_entry_price + fill.quantity * fill.price;
            position.avg_entry_price = total_cost / (held + fill.quantity);
            position.quantity += signed;
            position.entry_commission += fill.commission;
            position.last_price = fill.price;
            return None;
        }

        // Reducing, closing or reversing.
        let held = position.quantity.abs();
        let close_qty = fill.quantity.min(held);
        let side = position.side();

        let entry_share = position.entry_commission * close_qty / held;
        let exit_share = fill.commission * close_qty / fill.quantity;
        let gross = (fill.price - position.avg_entry_price) * close_qty * side.sign();

        let trade = TradeRecord {
            symbol: fill.symbol.clone(),
            side,
            entry: TradeLeg {
                timestamp: position.opened_at,
                price: position.avg_entry_price,
                bar_index: position.opened_bar,
            },
            exit: TradeLeg {
                timestamp: fill.timestamp,
                price: fill.price,
                bar_index: fill.bar_index,
            },
            quantity: close_qty,
            commission: entry_share + exit_share,
            realized_pnl: gross - entry_share - exit_share,
        };

        let remaining = fill.quantity - close_qty;
        if close_qty < held {
            position.quantity += signed;
            position.entry_commission -= entry_share;
            position.last_price = fill.price;
        } else if remaining > Decimal::ZERO {
            *position = Position::open(
                fill,
                fill.side.sign() * remaining,
                fill.commission - exit_share,
            );
        } else {
            self.positions.remove(&fill.symbol);
        }

        self.trades.push(trade.clone());
        Some(trade)
    }

    /// Value the portfolio at the bar's close and append a snapshot.
    ///
    /// Call exactly once per bar, after that bar's fills.
    pub fn mark_to_market(&mut self, symbol: &str, bar: &Bar) -> PortfolioSnapshot {
        if let Some(position) = self.positions.get_mut(symbol) {
            position.last_price = bar.close_decimal();
        }

        let snapshot = PortfolioSnapshot {
            timestamp: bar.timestamp,
            bar_index: self.history.len(),
            cash: self.cash,
            positions: self.positions.values().map(Position::snapshot).collect(),
            equity: self.equity(),
        };
        self.history.push(snapshot.clone());
        snapshot
    }
}
