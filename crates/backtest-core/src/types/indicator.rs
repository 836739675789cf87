//! Indicator identifiers and bar-aligned indicator output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Averaging used for RSI gains and losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RsiSmoothing {
    /// Simple average over the last `period` changes
    #[default]
    Simple,
    /// Wilder's recursive smoothing
    Wilder,
}

/// Which MACD output a series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MacdComponent {
    /// Fast EMA minus slow EMA
    Line,
    /// EMA of the MACD line
    Signal,
    /// Line minus signal
    #[default]
    Histogram,
}

/// Identifies an indicator and its parameters.
///
/// Strategies declare the specs they need; the engine streams one series per
/// distinct spec and exposes them through the market view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Sma {
        period: usize,
    },
    Ema {
        period: usize,
        /// Overrides the default alpha of 2 / (period + 1)
        #[serde(default)]
        smoothing: Option<f64>,
    },
    Rsi {
        period: usize,
        #[serde(default)]
        smoothing: RsiSmoothing,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
        #[serde(default)]
        component: MacdComponent,
    },
}

impl IndicatorSpec {
    /// Simple moving average.
    pub fn sma(period: usize) -> Self {
        IndicatorSpec::Sma { period }
    }

    /// Exponential moving average with the default smoothing.
    pub fn ema(period: usize) -> Self {
        IndicatorSpec::Ema {
            period,
            smoothing: None,
        }
    }

    /// RSI with simple averaging.
    pub fn rsi(period: usize) -> Self {
        IndicatorSpec::Rsi {
            period,
            smoothing: RsiSmoothing::Simple,
        }
    }

    /// One component of a MACD.
    pub fn macd(fast: usize, slow: usize, signal: usize, component: MacdComponent) -> Self {
        IndicatorSpec::Macd {
            fast,
            slow,
            signal,
            component,
        }
    }

    /// Index of the first defined value.
    pub fn first_defined_index(&self) -> usize {
        match self {
            IndicatorSpec::Sma { period } => period.saturating_sub(1),
            IndicatorSpec::Ema { .. } => 0,
            IndicatorSpec::Rsi { period, .. } => *period,
            IndicatorSpec::Macd { .. } => 0,
        }
    }
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSpec::Sma { period } => write!(f, "SMA({})", period),
            IndicatorSpec::Ema { period, .. } => write!(f, "EMA({})", period),
            IndicatorSpec::Rsi { period, .. } => write!(f, "RSI({})", period),
            IndicatorSpec::Macd {
                fast,
                slow,
                signal,
                component,
            } => write!(f, "MACD({},{},{}):{:?}", fast, slow, signal, component),
        }
    }
}

/// Indicator values aligned by index with the bars; `None` during warm-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries(Vec<Option<f64>>);

impl IndicatorSeries {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Append the value for the next bar.
    pub fn push(&mut self, value: Option<f64>) {
        self.0.push(value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at a bar index (`None` if undefined or out of range).
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn as_slice(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<Vec<Option<f64>>> for IndicatorSeries {
    fn from(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }
}

/// A set of indicator series keyed by spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    entries: Vec<(IndicatorSpec, IndicatorSeries)>,
}

impl IndicatorFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec, returning its slot. Duplicates share a slot.
    pub fn register(&mut self, spec: IndicatorSpec) -> usize {
        if let Some(slot) = self.slot(&spec) {
            return slot;
        }
        self.entries.push((spec, IndicatorSeries::new()));
        self.entries.len() - 1
    }

    fn slot(&self, spec: &IndicatorSpec) -> Option<usize> {
        self.entries.iter().position(|(s, _)| s == spec)
    }

    /// Append a value to the series in a slot.
    pub fn push(&mut self, slot: usize, value: Option<f64>) {
        if let Some((_, series)) = self.entries.get_mut(slot) {
            series.push(value);
        }
    }

    /// Replace the series for a spec, registering it if needed.
    pub fn insert(&mut self, spec: IndicatorSpec, series: IndicatorSeries) {
        let slot = self.register(spec);
        self.entries[slot].1 = series;
    }

    /// Look up the series for a spec.
    pub fn get(&self, spec: &IndicatorSpec) -> Option<&IndicatorSeries> {
        self.slot(spec).map(|slot| &self.entries[slot].1)
    }

    /// Registered specs in registration order.
    pub fn specs(&self) -> impl Iterator<Item = &IndicatorSpec> {
        self.entries.iter().map(|(s, _)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all values but keep the registered specs.
    pub fn clear_values(&mut self) {
        for (_, series) in &mut self.entries {
            series.clear();
        }
    }
}
