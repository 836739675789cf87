//! Helpers for driving strategies over a price path in tests.

use backtest_core::{Bar, MarketView, Signal, Strategy};
use backtest_indicators::IndicatorBank;

pub fn bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(i as i64 * 86_400_000, c, c, c, c, 1000.0))
        .collect()
}

/// Decisions for every bar, computed the way the engine streams them.
pub fn decisions(strategy: &dyn Strategy, closes: &[f64]) -> Vec<Option<Signal>> {
    let bars = bars(closes);
    let mut bank = IndicatorBank::new(&strategy.indicators()).unwrap();

    bars.iter()
        .enumerate()
        .map(|(t, bar)| {
            bank.update(bar);
            let view = MarketView::new("TEST", &bars[..=t], bank.frame());
            if strategy.is_warmed_up(view.len()) {
                strategy.decide(&view)
            } else {
                None
            }
        })
        .collect()
}
