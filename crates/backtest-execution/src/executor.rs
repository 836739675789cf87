//! Simulated order execution against a single bar.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;
use backtest_core::{
    Bar, ConfigError, ExecutionRejection, Fill, Order, OrderType, Portfolio, Side,
};

use crate::models::{CommissionModel, ReferencePrice, SlippageModel};

/// Decimal places kept for fractional quantities.
const QUANTITY_DP: u32 = 8;

/// Execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub reference_price: ReferencePrice,
    pub slippage: SlippageModel,
    pub commission: CommissionModel,
    /// Allow selling more than the long position
    pub allow_short: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            reference_price: ReferencePrice::Open,
            slippage: SlippageModel::default(),
            commission: CommissionModel::default(),
            allow_short: false,
        }
    }
}

impl ExecutionConfig {
    /// Frictionless execution: no slippage, no commission.
    pub fn frictionless() -> Self {
        Self {
            slippage: SlippageModel::None,
            commission: CommissionModel::None,
            ..Default::default()
        }
    }
}

/// Turns orders into fills, or rejects them.
///
/// The executor never mutates the portfolio; the caller applies the fill.
#[derive(Debug, Clone)]
pub struct OrderExecutor {
    config: ExecutionConfig,
}

impl OrderExecutor {
    pub fn new(config: ExecutionConfig) -> Result<Self, ConfigError> {
        config.slippage.validate()?;
        config.commission.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn allow_short(&self) -> bool {
        self.config.allow_short
    }

    /// Market fill price for `side` on `bar`: reference price plus
    /// slippage, clamped to the bar's range.
    pub fn estimated_price(&self, side: Side, bar: &Bar) -> Decimal {
        let reference = self.config.reference_price.price(bar);
        let slipped = self.config.slippage.apply(reference, side);
        slipped.clamp(bar.low_decimal(), bar.high_decimal())
    }

    /// Largest quantity that `cash` can pay for at `price`, commission
    /// included. Whole units unless `fractional`.
    pub fn affordable_quantity(&self, price: Decimal, cash: Decimal, fractional: bool) -> Decimal {
        let raw = self.config.commission.max_quantity(price, cash);
        let mut quantity = round_quantity(raw, fractional);

        // Commission models with a fixed part are not linear; step down until it fits.
        let step = if fractional {
            Decimal::new(1, QUANTITY_DP)
        } else {
            Decimal::ONE
        };
        while quantity > Decimal::ZERO && self.cost(price, quantity) > cash {
            quantity -= step;
        }
        quantity.max(Decimal::ZERO)
    }

    /// Execute `order` against `bar`, checking it against `portfolio`.
    pub fn execute(
        &self,
        order: &Order,
        bar: &Bar,
        portfolio: &Portfolio,
    ) -> Result<Fill, ExecutionRejection> {
        let market = self.estimated_price(order.side, bar);
        self.execute_at_price(order, bar, portfolio, market)
    }

    /// Execute with a fixed market price and no slippage, as for a
    /// force-close at the bar's close. Commission and all checks still apply.
    pub fn execute_at_price(
        &self,
        order: &Order,
        bar: &Bar,
        portfolio: &Portfolio,
        market: Decimal,
    ) -> Result<Fill, ExecutionRejection> {
        let result = self.try_execute(order, bar, portfolio, market);
        match &result {
            Ok(fill) => debug!(
                order_id = order.id,
                side = %fill.side,
                quantity = %fill.quantity,
                price = %fill.price,
                commission = %fill.commission,
                "Order filled"
            ),
            Err(rejection) => debug!(
                order_id = order.id,
                side = %order.side,
                quantity = %order.quantity,
                reason = %rejection,
                "Order rejected"
            ),
        }
        result
    }

    fn try_execute(
        &self,
        order: &Order,
        bar: &Bar,
        portfolio: &Portfolio,
        market: Decimal,
    ) -> Result<Fill, ExecutionRejection> {
        if order.quantity <= Decimal::ZERO {
            return Err(ExecutionRejection::InvalidQuantity(order.quantity));
        }

        if order.side == Side::Sell && !self.config.allow_short {
            let held = portfolio.quantity(&order.symbol);
            if order.quantity > held {
                return Err(ExecutionRejection::ShortingDisabled);
            }
        }

        let low = bar.low_decimal();
        let high = bar.high_decimal();
        let market = market.clamp(low, high);

        let price = match order.order_type {
            OrderType::Market => market,
            OrderType::Limit { price: limit } => {
                let reachable = match order.side {
                    Side::Buy => limit >= low,
                    Side::Sell => limit <= high,
                };
                if !reachable {
                    return Err(ExecutionRejection::LimitNotReached { limit, low, high });
                }
                match order.side {
                    Side::Buy => market.min(limit),
                    Side::Sell => market.max(limit),
                }
                .clamp(low, high)
            }
        };

        let commission = self.config.commission.commission(price, order.quantity);

        if order.side == Side::Buy {
            let required = price * order.quantity + commission;
            let available = portfolio.cash();
            if required > available {
                return Err(ExecutionRejection::InsufficientCash {
                    required,
                    available,
                });
            }
        }

        Ok(Fill {
            order_id: order.id,
            symbol: order.symbol.clone(),
            timestamp: order.timestamp,
            bar_index: order.bar_index,
            side: order.side,
            quantity: order.quantity,
            price,
            commission,
        })
    }

    fn cost(&self, price: Decimal, quantity: Decimal) -> Decimal {
        price * quantity + self.config.commission.commission(price, quantity)
    }
}

/// Round a quantity toward zero: whole units, or [`QUANTITY_DP`] places.
pub(crate) fn round_quantity(quantity: Decimal, fractional: bool) -> Decimal {
    if fractional {
        quantity.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::ToZero)
    } else {
        quantity.trunc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(0, open, high, low, close, 1000.0)
    }

    fn frictionless() -> OrderExecutor {
        OrderExecutor::new(ExecutionConfig::frictionless()).unwrap()
    }

    fn buy(quantity: Decimal) -> Order {
        Order::market(1, "TEST", 0, 0, Side::Buy, quantity)
    }

    fn sell(quantity: Decimal) -> Order {
        Order::market(2, "TEST", 0, 0, Side::Sell, quantity)
    }

    #[test]
    fn test_market_buy_at_open_with_costs() {
        let executor = OrderExecutor::new(ExecutionConfig::default()).unwrap();
        let portfolio = Portfolio::new(dec!(10000));
        let fill = executor
            .execute(&buy(dec!(10)), &bar(100.0, 101.0, 99.0, 100.5), &portfolio)
            .unwrap();

        assert_eq!(fill.price, dec!(100.05));
        assert_eq!(fill.commission, dec!(1.00050));
        assert_eq!(fill.cash_delta(), dec!(-1001.5005));
    }

    #[test]
    fn test_insufficient_cash_rejected() {
        let portfolio = Portfolio::new(dec!(100));
        let result = frictionless().execute(&buy(dec!(15)), &bar(10.0, 10.0, 10.0, 10.0), &portfolio);

        assert_eq!(
            result,
            Err(ExecutionRejection::InsufficientCash {
                required: dec!(150),
                available: dec!(100),
            })
        );
    }

    #[test]
    fn test_short_policy() {
        let portfolio = Portfolio::new(dec!(1000));
        let b = bar(10.0, 10.0, 10.0, 10.0);

        assert_eq!(
            frictionless().execute(&sell(dec!(1)), &b, &portfolio),
            Err(ExecutionRejection::ShortingDisabled)
        );

        let shorting = OrderExecutor::new(ExecutionConfig {
            allow_short: true,
            ..ExecutionConfig::frictionless()
        })
        .unwrap();
        let fill = shorting.execute(&sell(dec!(1)), &b, &portfolio).unwrap();
        assert_eq!(fill.cash_delta(), dec!(10));
    }

    #[test]
    fn test_invalid_quantity() {
        let portfolio = Portfolio::new(dec!(1000));
        assert_eq!(
            frictionless().execute(&buy(dec!(0)), &bar(10.0, 10.0, 10.0, 10.0), &portfolio),
            Err(ExecutionRejection::InvalidQuantity(dec!(0)))
        );
    }

    #[test]
    fn test_fill_clamped_to_bar_range() {
        let executor = OrderExecutor::new(ExecutionConfig {
            slippage: SlippageModel::FixedAmount { amount: dec!(5) },
            commission: CommissionModel::None,
            ..Default::default()
        })
        .unwrap();
        let b = bar(100.0, 102.0, 98.0, 101.0);
        assert_eq!(executor.estimated_price(Side::Buy, &b), dec!(102));
        assert_eq!(executor.estimated_price(Side::Sell, &b), dec!(98));
    }

    #[test]
    fn test_limit_orders() {
        let portfolio = Portfolio::new(dec!(1000));
        let b = bar(100.0, 102.0, 98.0, 101.0);

        let reachable = buy(dec!(1)).with_limit(dec!(99));
        let fill = frictionless().execute(&reachable, &b, &portfolio).unwrap();
        assert_eq!(fill.price, dec!(99));

        let unreachable = buy(dec!(1)).with_limit(dec!(97));
        assert!(matches!(
            frictionless().execute(&unreachable, &b, &portfolio),
            Err(ExecutionRejection::LimitNotReached { .. })
        ));
    }

    #[test]
    fn test_execute_at_close_skips_slippage() {
        let executor = OrderExecutor::new(ExecutionConfig::default()).unwrap();
        let mut portfolio = Portfolio::new(dec!(10000));
        let b = bar(100.0, 104.0, 99.0, 103.0);
        let entry = executor.execute(&buy(dec!(10)), &b, &portfolio).unwrap();
        portfolio.apply(&entry);

        let fill = executor
            .execute_at_price(&sell(dec!(10)), &b, &portfolio, b.close_decimal())
            .unwrap();
        assert_eq!(fill.price, dec!(103));
        assert_eq!(fill.commission, dec!(1.03));
    }

    #[test]
    fn test_affordable_quantity() {
        let executor = frictionless();
        assert_eq!(executor.affordable_quantity(dec!(12), dec!(1000), false), dec!(83));
        assert_eq!(
            executor.affordable_quantity(dec!(3), dec!(10), true),
            dec!(3.33333333)
        );

        let fixed = OrderExecutor::new(ExecutionConfig {
            commission: CommissionModel::Fixed { amount: dec!(5) },
            ..ExecutionConfig::frictionless()
        })
        .unwrap();
        assert_eq!(fixed.affordable_quantity(dec!(10), dec!(104), false), dec!(9));
    }
}
