//! Price, slippage and commission models.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use backtest_core::{Bar, ConfigError, Side};

const BPS: Decimal = dec!(10000);

/// Which bar price market orders are executed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePrice {
    /// Open of the bar the order is placed on
    #[default]
    Open,
    /// Close of the bar the order is placed on
    Close,
}

impl ReferencePrice {
    pub fn price(&self, bar: &Bar) -> Decimal {
        match self {
            ReferencePrice::Open => bar.open_decimal(),
            ReferencePrice::Close => bar.close_decimal(),
        }
    }
}

/// Price impact applied against the trader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlippageModel {
    None,
    /// Basis points of the reference price
    FixedBps { bps: Decimal },
    /// Absolute price offset per unit
    FixedAmount { amount: Decimal },
}

impl Default for SlippageModel {
    fn default() -> Self {
        SlippageModel::FixedBps { bps: dec!(5) }
    }
}

impl SlippageModel {
    /// Price after slippage: buys pay more, sells receive less.
    pub fn apply(&self, price: Decimal, side: Side) -> Decimal {
        let offset = match self {
            SlippageModel::None => Decimal::ZERO,
            SlippageModel::FixedBps { bps } => price * *bps / BPS,
            SlippageModel::FixedAmount { amount } => *amount,
        };
        match side {
            Side::Buy => price + offset,
            Side::Sell => (price - offset).max(Decimal::ZERO),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SlippageModel::FixedBps { bps } if bps.is_sign_negative() => {
                Err(ConfigError::invalid("slippage.bps", "must not be negative"))
            }
            SlippageModel::FixedAmount { amount } if amount.is_sign_negative() => {
                Err(ConfigError::invalid("slippage.amount", "must not be negative"))
            }
            _ => Ok(()),
        }
    }
}

/// Fee charged per fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommissionModel {
    None,
    /// Flat fee per fill
    Fixed { amount: Decimal },
    /// Basis points of the traded notional
    Bps { bps: Decimal },
    /// Fee per unit traded
    PerUnit { amount: Decimal },
}

impl Default for CommissionModel {
    fn default() -> Self {
        CommissionModel::Bps { bps: dec!(10) }
    }
}

impl CommissionModel {
    /// Commission for trading `quantity` at `price`.
    pub fn commission(&self, price: Decimal, quantity: Decimal) -> Decimal {
        match self {
            CommissionModel::None => Decimal::ZERO,
            CommissionModel::Fixed { amount } => *amount,
            CommissionModel::Bps { bps } => price * quantity * *bps / BPS,
            CommissionModel::PerUnit { amount } => quantity * *amount,
        }
    }

    /// Largest quantity whose notional plus commission fits in `cash`,
    /// before rounding.
    pub(crate) fn max_quantity(&self, price: Decimal, cash: Decimal) -> Decimal {
        if price <= Decimal::ZERO || cash <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let quantity = match self {
            CommissionModel::None => cash / price,
            CommissionModel::Fixed { amount } => (cash - *amount) / price,
            CommissionModel::Bps { bps } => cash / (price * (Decimal::ONE + *bps / BPS)),
            CommissionModel::PerUnit { amount } => cash / (price + *amount),
        };
        quantity.max(Decimal::ZERO)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let value = match self {
            CommissionModel::None => return Ok(()),
            CommissionModel::Fixed { amount } | CommissionModel::PerUnit { amount } => amount,
            CommissionModel::Bps { bps } => bps,
        };
        if value.is_sign_negative() {
            return Err(ConfigError::invalid("commission", "must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_price() {
        let bar = Bar::new(0, 10.0, 12.0, 9.0, 11.0, 100.0);
        assert_eq!(ReferencePrice::Open.price(&bar), dec!(10));
        assert_eq!(ReferencePrice::Close.price(&bar), dec!(11));
    }

    #[test]
    fn test_slippage_is_adverse() {
        let model = SlippageModel::FixedBps { bps: dec!(5) };
        assert_eq!(model.apply(dec!(100), Side::Buy), dec!(100.05));
        assert_eq!(model.apply(dec!(100), Side::Sell), dec!(99.95));

        let model = SlippageModel::FixedAmount { amount: dec!(0.1) };
        assert_eq!(model.apply(dec!(20), Side::Buy), dec!(20.1));
        assert_eq!(model.apply(dec!(20), Side::Sell), dec!(19.9));

        assert_eq!(SlippageModel::None.apply(dec!(20), Side::Buy), dec!(20));
    }

    #[test]
    fn test_commission_models() {
        assert_eq!(CommissionModel::None.commission(dec!(100), dec!(10)), dec!(0));
        assert_eq!(
            CommissionModel::Fixed { amount: dec!(1) }.commission(dec!(100), dec!(10)),
            dec!(1)
        );
        assert_eq!(CommissionModel::default().commission(dec!(100), dec!(10)), dec!(1));
        assert_eq!(
            CommissionModel::PerUnit { amount: dec!(0.01) }.commission(dec!(100), dec!(10)),
            dec!(0.1)
        );
    }

    #[test]
    fn test_max_quantity_covers_commission() {
        let model = CommissionModel::Bps { bps: dec!(10) };
        let q = model.max_quantity(dec!(100), dec!(1001)).floor();
        assert_eq!(q, dec!(10));
        assert!(dec!(100) * q + model.commission(dec!(100), q) <= dec!(1001));

        let fixed = CommissionModel::Fixed { amount: dec!(5) };
        assert_eq!(fixed.max_quantity(dec!(10), dec!(4)), dec!(0));
    }

    #[test]
    fn test_negative_costs_rejected() {
        assert!(SlippageModel::FixedBps { bps: dec!(-1) }.validate().is_err());
        assert!(CommissionModel::Fixed { amount: dec!(-1) }.validate().is_err());
        assert!(CommissionModel::default().validate().is_ok());
    }
}
