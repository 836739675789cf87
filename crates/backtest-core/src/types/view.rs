//! Point-in-time view of the market handed to strategies.

use super::{Bar, IndicatorFrame, IndicatorSpec};

/// Market state as of one bar.
///
/// Only bars up to and including the current one are visible, and every
/// indicator series is truncated to the same length, so a strategy cannot
/// read future data.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    symbol: &'a str,
    bars: &'a [Bar],
    frame: &'a IndicatorFrame,
}

impl<'a> MarketView<'a> {
    /// Build a view over `bars`, which must end at the current bar.
    pub fn new(symbol: &'a str, bars: &'a [Bar], frame: &'a IndicatorFrame) -> Self {
        Self {
            symbol,
            bars,
            frame,
        }
    }

    pub fn symbol(&self) -> &str {
        self.symbol
    }

    /// Visible bars, oldest first.
    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    /// Number of visible bars.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Index of the current bar.
    pub fn index(&self) -> usize {
        self.bars.len().saturating_sub(1)
    }

    /// The current bar.
    pub fn current(&self) -> Option<&'a Bar> {
        self.bars.last()
    }

    /// Timestamp of the current bar (0 for an empty view).
    pub fn timestamp(&self) -> i64 {
        self.current().map(|b| b.timestamp).unwrap_or_default()
    }

    /// Indicator values up to the current bar.
    pub fn indicator(&self, spec: &IndicatorSpec) -> Option<&'a [Option<f64>]> {
        let series = self.frame.get(spec)?.as_slice();
        Some(&series[..series.len().min(self.bars.len())])
    }

    /// Indicator value at the current bar.
    pub fn value(&self, spec: &IndicatorSpec) -> Option<f64> {
        let series = self.indicator(spec)?;
        if series.len() != self.bars.len() {
            return None;
        }
        series.last().copied().flatten()
    }

    /// Indicator values at the previous and current bar, when both are defined.
    pub fn last_two(&self, spec: &IndicatorSpec) -> Option<(f64, f64)> {
        let series = self.indicator(spec)?;
        if series.len() != self.bars.len() || series.len() < 2 {
            return None;
        }
        let n = series.len();
        Some((series[n - 2]?, series[n - 1]?))
    }
}
