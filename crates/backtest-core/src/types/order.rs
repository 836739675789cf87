//! Order and fill types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the sign for position calculations (+1 for buy, -1 for sell).
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderType {
    /// Fill at the bar's reference price
    #[default]
    Market,
    /// Fill only if the limit price is reachable within the bar
    Limit { price: Decimal },
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit { price } => write!(f, "LIMIT@{}", price),
        }
    }
}

/// Why an order was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderReason {
    /// Produced from a strategy signal
    Signal,
    /// Closing an open position on the final bar
    ForceClose,
}

/// Instruction to trade, produced from a signal and consumed in the same bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Sequential order ID within a run
    pub id: u64,
    /// Symbol to trade
    pub symbol: String,
    /// Bar timestamp (Unix milliseconds) the order belongs to
    pub timestamp: i64,
    /// Index of the bar in the series
    pub bar_index: usize,
    /// Buy or sell
    pub side: Side,
    /// Quantity to trade (always positive)
    pub quantity: Decimal,
    /// Type of order
    pub order_type: OrderType,
    /// Origin of the order
    pub reason: OrderReason,
}

impl Order {
    /// Create a market order.
    pub fn market(
        id: u64,
        symbol: impl Into<String>,
        timestamp: i64,
        bar_index: usize,
        side: Side,
        quantity: Decimal,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            timestamp,
            bar_index,
            side,
            quantity,
            order_type: OrderType::Market,
            reason: OrderReason::Signal,
        }
    }

    /// Turn the order into a limit order.
    pub fn with_limit(mut self, price: Decimal) -> Self {
        self.order_type = OrderType::Limit { price };
        self
    }

    /// Set the order reason.
    pub fn with_reason(mut self, reason: OrderReason) -> Self {
        self.reason = reason;
        self
    }
}

/// Realized execution of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Order ID this fill belongs to
    pub order_id: u64,
    /// Symbol traded
    pub symbol: String,
    /// Timestamp of the fill (Unix milliseconds)
    pub timestamp: i64,
    /// Index of the bar the fill happened on
    pub bar_index: usize,
    /// Buy or sell
    pub side: Side,
    /// Quantity filled
    pub quantity: Decimal,
    /// Price after slippage
    pub price: Decimal,
    /// Commission charged
    pub commission: Decimal,
}

impl Fill {
    /// Gross traded value (price * quantity).
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }

    /// Cash change caused by the fill, commission included.
    pub fn cash_delta(&self) -> Decimal {
        match self.side {
            Side::Buy => -(self.notional() + self.commission),
            Side::Sell => self.notional() - self.commission,
        }
    }
}
