//! Backtesting engine.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use backtest_core::{
    traits::{DataRequest, DataSource, Strategy},
    Bar, BacktestError, BacktestResult, BarSeries, ConfigError, Direction, ExecutionRejection,
    Fill, MarketView, Order, OrderReason, Portfolio, Side, Signal,
};
use backtest_execution::{
    CommissionModel, ExecutionConfig, OrderExecutor, PositionSizer, ReferencePrice, SizingConfig,
    SlippageModel,
};
use backtest_indicators::IndicatorBank;
use backtest_strategies::StrategySpec;

use crate::audit::{AuditEvent, AuditLog};
use crate::metrics::{MetricsCalculator, MetricsConfig};
use crate::report::BacktestReport;

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash
    pub initial_cash: Decimal,
    pub commission: CommissionModel,
    pub slippage: SlippageModel,
    /// Bar price market orders execute against
    pub reference_price: ReferencePrice,
    pub allow_short: bool,
    pub sizing: SizingConfig,
    /// Strategy identifier and parameters
    pub strategy: StrategySpec,
    /// Close any open position at the last bar's close
    pub force_close: bool,
    /// Annual risk-free rate used by Sharpe and Sortino
    pub risk_free_rate: f64,
    /// Overrides the value derived from the series timeframe
    pub periods_per_year: Option<f64>,
    /// Keep a per-bar audit log in the report
    pub audit: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(10000),
            commission: CommissionModel::default(),
            slippage: SlippageModel::default(),
            reference_price: ReferencePrice::default(),
            allow_short: false,
            sizing: SizingConfig::default(),
            strategy: StrategySpec::default(),
            force_close: true,
            risk_free_rate: 0.0,
            periods_per_year: None,
            audit: false,
        }
    }
}

impl BacktestConfig {
    /// Execution settings for the order executor.
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            reference_price: self.reference_price,
            slippage: self.slippage,
            commission: self.commission,
            allow_short: self.allow_short,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(ConfigError::invalid("initial_cash", "must be positive"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::invalid("risk_free_rate", "must be finite"));
        }
        if let Some(ppy) = self.periods_per_year {
            if !(ppy.is_finite() && ppy > 0.0) {
                return Err(ConfigError::invalid("periods_per_year", "must be positive"));
            }
        }
        Ok(())
    }
}

/// Lifecycle of a [`Backtester`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Initialized,
    Running,
    Completed,
    Aborted,
}

/// Event-driven, single-symbol backtester.
///
/// Everything that can be misconfigured is built in [`Backtester::new`], so a
/// run can only fail on bad input data.
pub struct Backtester {
    config: BacktestConfig,
    strategy: Box<dyn Strategy>,
    bank: IndicatorBank,
    executor: OrderExecutor,
    sizer: PositionSizer,
    state: RunState,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = config.strategy.build()?;
        let bank = IndicatorBank::new(&strategy.indicators())?;
        let executor = OrderExecutor::new(config.execution())?;
        let sizer = PositionSizer::new(config.sizing.clone())?;

        Ok(Self {
            config,
            strategy,
            bank,
            executor,
            sizer,
            state: RunState::Initialized,
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Fetch the series from `source`, then run on it.
    pub fn run_source(
        &mut self,
        source: &dyn DataSource,
        request: &DataRequest,
    ) -> BacktestResult<BacktestReport> {
        let series = source.fetch(request).map_err(|e| {
            error!(source = source.name(), symbol = %request.symbol, error = %e, "Failed to load bars");
            self.state = RunState::Aborted;
            BacktestError::from(e)
        })?;
        self.run(&series)
    }

    /// Run over a whole series.
    ///
    /// The series is validated before any state is created; a
    /// [`DataError`](backtest_core::DataError) aborts the run.
    pub fn run(&mut self, series: &BarSeries) -> BacktestResult<BacktestReport> {
        self.run_inner(series, None)
    }

    /// Run over `series` and measure beta and alpha against `benchmark`.
    ///
    /// Benchmark bars are matched to the series by timestamp; if any series
    /// bar has no benchmark bar, beta and alpha are NaN.
    pub fn run_with_benchmark(
        &mut self,
        series: &BarSeries,
        benchmark: &BarSeries,
    ) -> BacktestResult<BacktestReport> {
        self.run_inner(series, Some(benchmark))
    }

    fn run_inner(
        &mut self,
        series: &BarSeries,
        benchmark: Option<&BarSeries>,
    ) -> BacktestResult<BacktestReport> {
        for s in std::iter::once(series).chain(benchmark) {
            if let Err(e) = s.validate() {
                error!(symbol = %s.symbol, error = %e, "Invalid bar series, aborting");
                self.state = RunState::Aborted;
                return Err(e.into());
            }
        }

        self.state = RunState::Running;
        info!(
            symbol = %series.symbol,
            timeframe = %series.timeframe,
            bars = series.len(),
            strategy = self.strategy.name(),
            benchmark = benchmark.map(|b| b.symbol.as_str()),
            "Starting backtest"
        );

        let benchmark_returns = benchmark.and_then(|b| aligned_returns(series, b));
        let report = self.simulate(series, benchmark_returns.as_deref());

        info!(
            symbol = %report.symbol,
            trades = report.trades.len(),
            rejected = report.rejected_orders,
            total_return = report.metrics.total_return,
            "Backtest complete"
        );
        self.state = RunState::Completed;
        Ok(report)
    }

    fn simulate(&self, series: &BarSeries, benchmark: Option<&[f64]>) -> BacktestReport {
        let bars = series.bars();
        let symbol = series.symbol.as_str();
        let last = bars.len().saturating_sub(1);
        let progress_step = (bars.len() / 10).max(1);

        let mut bank = self.bank.clone();
        bank.reset();
        let mut run = RunContext::new(symbol, self.config.initial_cash, self.config.audit);

        for (index, bar) in bars.iter().enumerate() {
            bank.update(bar);

            let view = MarketView::new(symbol, &bars[..=index], bank.frame());
            let signal = if self.strategy.is_warmed_up(view.len()) {
                self.strategy.decide(&view)
            } else {
                None
            };

            if let Some(signal) = signal {
                run.audit.record(|| AuditEvent::Signal {
                    bar_index: index,
                    signal: signal.clone(),
                });
                self.act_on_signal(&mut run, &signal, bar, index);
            }

            if index == last && self.config.force_close {
                self.force_close(&mut run, bar, index);
            }

            run.portfolio.mark_to_market(symbol, bar);

            if (index + 1) % progress_step == 0 {
                debug!(
                    bar = index + 1,
                    of = bars.len(),
                    equity = %run.portfolio.equity(),
                    "Progress"
                );
            }
        }

        let ppy = self
            .config
            .periods_per_year
            .unwrap_or_else(|| series.timeframe.periods_per_year());
        let calculator = MetricsCalculator::new(MetricsConfig {
            periods_per_year: ppy,
            risk_free_rate: self.config.risk_free_rate,
        });

        let RunContext {
            portfolio,
            audit,
            rejected_orders,
            ..
        } = run;
        let (snapshots, trades) = portfolio.into_parts();
        let metrics = calculator.calculate_with_benchmark(&snapshots, &trades, benchmark);

        BacktestReport {
            symbol: series.symbol.clone(),
            timeframe: series.timeframe,
            strategy: self.strategy.name().to_string(),
            snapshots,
            trades,
            metrics,
            audit: audit.into_events(),
            bars_processed: bars.len(),
            rejected_orders,
        }
    }

    /// Close an opposing position first, then open the new one.
    fn act_on_signal(&self, run: &mut RunContext, signal: &Signal, bar: &Bar, index: usize) {
        let held = run.portfolio.quantity(run.symbol);

        let (closing, opening) = match signal.direction {
            Direction::Long if held > Decimal::ZERO => return,
            Direction::Short if held < Decimal::ZERO => return,
            Direction::Long => (held < Decimal::ZERO, Some(Side::Buy)),
            Direction::Short => (held > Decimal::ZERO, Some(Side::Sell)),
            Direction::Flat => (!held.is_zero(), None),
        };

        if closing {
            let side = if held > Decimal::ZERO { Side::Sell } else { Side::Buy };
            let order = run.next_order(bar, index, side, held.abs(), OrderReason::Signal);
            let fill = self.executor.execute(&order, bar, &run.portfolio);
            if !run.settle(order, fill) {
                return;
            }
        }

        let Some(side) = opening else {
            return;
        };

        let price = self.executor.estimated_price(side, bar);
        let quantity = self
            .sizer
            .calculate(&run.portfolio, signal, price, &self.executor);
        if quantity <= Decimal::ZERO {
            debug!(bar = index, side = %side, price = %price, "Position sized to zero, no order");
            run.audit.record(|| AuditEvent::Skipped {
                bar_index: index,
                reason: format!("{} sized to zero at {}", side, price),
            });
            return;
        }

        let order = run.next_order(bar, index, side, quantity, OrderReason::Signal);
        let fill = self.executor.execute(&order, bar, &run.portfolio);
        run.settle(order, fill);
    }

    /// Close any open position at the bar's close.
    fn force_close(&self, run: &mut RunContext, bar: &Bar, index: usize) {
        let held = run.portfolio.quantity(run.symbol);
        if held.is_zero() {
            return;
        }

        let side = if held > Decimal::ZERO { Side::Sell } else { Side::Buy };
        let order = run.next_order(bar, index, side, held.abs(), OrderReason::ForceClose);
        let fill = self
            .executor
            .execute_at_price(&order, bar, &run.portfolio, bar.close_decimal());
        run.settle(order, fill);
    }
}

/// Benchmark close-to-close returns on the series' timestamps.
fn aligned_returns(series: &BarSeries, benchmark: &BarSeries) -> Option<Vec<f64>> {
    let closes: HashMap<i64, f64> = benchmark.iter().map(|b| (b.timestamp, b.close)).collect();
    let aligned = series
        .iter()
        .map(|bar| closes.get(&bar.timestamp).copied())
        .collect::<Option<Vec<f64>>>();
    if aligned.is_none() {
        warn!(benchmark = %benchmark.symbol, "Benchmark does not cover every bar, beta/alpha undefined");
    }
    aligned.map(|closes| closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

/// Mutable state owned by a single run.
struct RunContext<'a> {
    symbol: &'a str,
    portfolio: Portfolio,
    audit: AuditLog,
    next_order_id: u64,
    rejected_orders: usize,
}

impl<'a> RunContext<'a> {
    fn new(symbol: &'a str, initial_cash: Decimal, audit: bool) -> Self {
        Self {
            symbol,
            portfolio: Portfolio::new(initial_cash),
            audit: AuditLog::new(audit),
            next_order_id: 1,
            rejected_orders: 0,
        }
    }

    fn next_order(
        &mut self,
        bar: &Bar,
        index: usize,
        side: Side,
        quantity: Decimal,
        reason: OrderReason,
    ) -> Order {
        let id = self.next_order_id;
        self.next_order_id += 1;
        Order::market(id, self.symbol, bar.timestamp, index, side, quantity).with_reason(reason)
    }

    /// Apply a fill, or count the rejection. Returns whether it filled.
    fn settle(
        &mut self,
        order: Order,
        result: Result<Fill, ExecutionRejection>,
    ) -> bool {
        match result {
            Ok(fill) => {
                let trade = self.portfolio.apply(&fill);
                let reason = order.reason;
                self.audit.record(|| AuditEvent::Filled { reason, fill });
                if let Some(trade) = trade {
                    debug!(
                        side = ?trade.side,
                        quantity = %trade.quantity,
                        pnl = %trade.realized_pnl,
                        "Trade closed"
                    );
                    self.audit.record(|| AuditEvent::TradeClosed { trade });
                }
                true
            }
            Err(rejection) => {
                self.rejected_orders += 1;
                self.audit.record(|| AuditEvent::Rejected {
                    order,
                    reason: rejection.to_string(),
                });
                false
            }
        }
    }
}
