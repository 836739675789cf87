//! Performance metrics over a finished run.
//!
//! Every ratio that cannot be computed (too few snapshots, zero variance,
//! no trades, zero drawdown) is reported as `f64::NAN` rather than an error.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use backtest_core::{PortfolioSnapshot, TradeRecord};

/// Denominators below this are treated as zero.
const ZERO_TOLERANCE: f64 = 1e-12;

/// Annualisation and risk-free settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Snapshots per year, e.g. 252 for daily bars
    pub periods_per_year: f64,
    /// Annual risk-free rate as a fraction
    pub risk_free_rate: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 252.0,
            risk_free_rate: 0.0,
        }
    }
}

/// Risk and return statistics of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub initial_equity: f64,
    pub final_equity: f64,
    /// equity(last) / equity(first) - 1
    pub total_return: f64,
    pub annualized_return: f64,
    /// Annualised sample standard deviation of per-period returns
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Largest peak-to-trough decline, as a fraction in [0, 1]
    pub max_drawdown: f64,
    pub calmar_ratio: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    /// Sum of realized P&L, net of commission
    pub net_profit: f64,
    pub total_commission: f64,
    /// Share of snapshots with an open position
    pub exposure: f64,
    /// Number of snapshots
    pub periods: usize,
    /// Sensitivity of per-period returns to the benchmark's
    pub beta: f64,
    /// Mean per-period return not explained by beta
    pub alpha: f64,
}

/// Computes [`Metrics`] from snapshots and trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator {
    config: MetricsConfig,
}

impl MetricsCalculator {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn calculate(&self, snapshots: &[PortfolioSnapshot], trades: &[TradeRecord]) -> Metrics {
        self.calculate_with_benchmark(snapshots, trades, None)
    }

    /// Like [`calculate`](Self::calculate), also filling `beta` and `alpha`.
    ///
    /// `benchmark` holds per-period benchmark returns aligned with the
    /// snapshots' returns, so one shorter than `snapshots`. Without it, or
    /// when it does not line up, beta and alpha are NaN.
    pub fn calculate_with_benchmark(
        &self,
        snapshots: &[PortfolioSnapshot],
        trades: &[TradeRecord],
        benchmark: Option<&[f64]>,
    ) -> Metrics {
        let equity: Vec<f64> = snapshots.iter().map(|s| to_f64(s.equity)).collect();
        let returns = period_returns(&equity);
        let ppy = self.config.periods_per_year;

        let initial_equity = equity.first().copied().unwrap_or(f64::NAN);
        let final_equity = equity.last().copied().unwrap_or(f64::NAN);

        let total_return = if initial_equity > 0.0 {
            final_equity / initial_equity - 1.0
        } else {
            f64::NAN
        };

        let annualized_return = if equity.len() >= 2 && ppy > 0.0 {
            let years_factor = ppy / (equity.len() - 1) as f64;
            (1.0 + total_return).powf(years_factor) - 1.0
        } else {
            f64::NAN
        };

        let rf_per_period = if ppy > 0.0 {
            self.config.risk_free_rate / ppy
        } else {
            f64::NAN
        };
        let mean_return = mean(&returns);
        let std_dev = sample_std(&returns);
        let volatility = std_dev * ppy.sqrt();

        let excess = mean_return - rf_per_period;
        let sharpe_ratio = ratio(excess, std_dev) * ppy.sqrt();
        let sortino_ratio = ratio(excess, downside_deviation(&returns, rf_per_period)) * ppy.sqrt();

        let max_drawdown = max_drawdown(&equity);
        let calmar_ratio = ratio(annualized_return, max_drawdown);

        let trade_stats = TradeStats::from_trades(trades);
        let (beta, alpha) = match benchmark {
            Some(benchmark) => beta_alpha(&returns, benchmark),
            None => (f64::NAN, f64::NAN),
        };

        let exposure = if snapshots.is_empty() {
            f64::NAN
        } else {
            snapshots.iter().filter(|s| s.has_exposure()).count() as f64 / snapshots.len() as f64
        };

        Metrics {
            initial_equity,
            final_equity,
            total_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            calmar_ratio,
            trade_count: trades.len(),
            winning_trades: trade_stats.winners,
            losing_trades: trade_stats.losers,
            win_rate: trade_stats.win_rate(trades.len()),
            profit_factor: ratio(trade_stats.gross_profit, trade_stats.gross_loss),
            average_win: ratio(trade_stats.gross_profit, trade_stats.winners as f64),
            average_loss: ratio(trade_stats.gross_loss, trade_stats.losers as f64),
            net_profit: trade_stats.net_profit,
            total_commission: trade_stats.commission,
            exposure,
            periods: snapshots.len(),
            beta,
            alpha,
        }
    }
}

#[derive(Debug, Default)]
struct TradeStats {
    winners: usize,
    losers: usize,
    gross_profit: f64,
    gross_loss: f64,
    net_profit: f64,
    commission: f64,
}

impl TradeStats {
    fn from_trades(trades: &[TradeRecord]) -> Self {
        let mut stats = Self::default();
        for trade in trades {
            let pnl = to_f64(trade.realized_pnl);
            if pnl > 0.0 {
                stats.winners += 1;
                stats.gross_profit += pnl;
            } else if pnl < 0.0 {
                stats.losers += 1;
                stats.gross_loss += -pnl;
            }
            stats.net_profit += pnl;
            stats.commission += to_f64(trade.commission);
        }
        stats
    }

    fn win_rate(&self, count: usize) -> f64 {
        ratio(self.winners as f64, count as f64)
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// `numerator / denominator`, NaN when the denominator is (numerically)
/// zero or invalid.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.is_finite() && denominator > ZERO_TOLERANCE {
        numerator / denominator
    } else {
        f64::NAN
    }
}

/// Simple percentage change between consecutive values.
fn period_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { f64::NAN })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Root mean square of returns below `target`, over all periods.
fn downside_deviation(values: &[f64], target: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let sum_sq: f64 = values
        .iter()
        .map(|v| (v - target).min(0.0).powi(2))
        .sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Beta and per-period alpha of `returns` against `benchmark`.
///
/// Both are NaN unless the series have the same length (at least two) and
/// the benchmark varies.
pub fn beta_alpha(returns: &[f64], benchmark: &[f64]) -> (f64, f64) {
    if returns.len() != benchmark.len() || returns.len() < 2 {
        return (f64::NAN, f64::NAN);
    }
    let mean_r = mean(returns);
    let mean_b = mean(benchmark);
    let n = (returns.len() - 1) as f64;
    let covariance = returns
        .iter()
        .zip(benchmark)
        .map(|(r, b)| (r - mean_r) * (b - mean_b))
        .sum::<f64>()
        / n;
    let variance = benchmark.iter().map(|b| (b - mean_b).powi(2)).sum::<f64>() / n;

    let beta = ratio(covariance, variance);
    (beta, mean_r - beta * mean_b)
}

/// Largest decline from a running peak, as a fraction of the peak.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    if equity.is_empty() {
        return f64::NAN;
    }
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &value in equity {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    worst.clamp(0.0, 1.0)
}
