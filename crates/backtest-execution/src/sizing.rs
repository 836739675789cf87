//! Position sizing algorithms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use backtest_core::{ConfigError, Portfolio, Signal};

use crate::executor::{round_quantity, OrderExecutor};

/// Position sizing method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionSizing {
    /// Fraction of current equity, in (0, 1]
    FractionOfEquity { fraction: Decimal },
    /// Fixed number of units
    FixedQuantity { quantity: Decimal },
    /// Fixed cash amount
    FixedNotional { amount: Decimal },
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::FractionOfEquity {
            fraction: Decimal::ONE,
        }
    }
}

/// Sizing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SizingConfig {
    pub method: PositionSizing,
    /// Multiply the size by the signal strength
    pub scale_by_strength: bool,
    /// Allow fractional units
    pub fractional: bool,
}

/// Position sizer calculates the size of new positions.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    pub fn new(config: SizingConfig) -> Result<Self, ConfigError> {
        match &config.method {
            PositionSizing::FractionOfEquity { fraction } => {
                if *fraction <= Decimal::ZERO || *fraction > Decimal::ONE {
                    return Err(ConfigError::invalid("sizing.fraction", "must be in (0, 1]"));
                }
            }
            PositionSizing::FixedQuantity { quantity } => {
                if *quantity <= Decimal::ZERO {
                    return Err(ConfigError::invalid("sizing.quantity", "must be positive"));
                }
            }
            PositionSizing::FixedNotional { amount } => {
                if *amount <= Decimal::ZERO {
                    return Err(ConfigError::invalid("sizing.amount", "must be positive"));
                }
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Quantity to open at `price`, capped by what the portfolio's cash can
    /// pay for through `executor`. Zero means no order.
    pub fn calculate(
        &self,
        portfolio: &Portfolio,
        signal: &Signal,
        price: Decimal,
        executor: &OrderExecutor,
    ) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let base = match &self.config.method {
            PositionSizing::FractionOfEquity { fraction } => {
                portfolio.equity().max(Decimal::ZERO) * *fraction / price
            }
            PositionSizing::FixedQuantity { quantity } => *quantity,
            PositionSizing::FixedNotional { amount } => *amount / price,
        };

        let scaled = if self.config.scale_by_strength {
            base * Decimal::try_from(signal.strength).unwrap_or(Decimal::ONE)
        } else {
            base
        };

        let affordable =
            executor.affordable_quantity(price, portfolio.cash(), self.config.fractional);
        round_quantity(scaled, self.config.fractional).min(affordable)
    }
}
