//! Momentum indicators.

use backtest_core::traits::{Indicator, StreamingIndicator};
use backtest_core::{ConfigError, RsiSmoothing};
use serde::{Deserialize, Serialize};

use crate::buffer::RingBuffer;
use crate::moving_average::{Ema, EmaState};

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes
/// to evaluate overbought or oversold conditions. Average gain and loss
/// are taken over the last `period` changes, so the first defined value is
/// at index `period`. A window without losses saturates at 100.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    smoothing: RsiSmoothing,
}

impl Rsi {
    /// Create a new RSI with rolling simple averages.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        Self::with_smoothing(period, RsiSmoothing::Simple)
    }

    /// Create an RSI with the given averaging method.
    pub fn with_smoothing(period: usize, smoothing: RsiSmoothing) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::invalid("period", "must be greater than 0"));
        }
        Ok(Self { period, smoothing })
    }

    /// Fresh incremental state for this RSI.
    pub fn state(&self) -> RsiState {
        RsiState {
            period: self.period,
            smoothing: self.smoothing,
            previous: None,
            gains: RingBuffer::new(self.period),
            losses: RingBuffer::new(self.period),
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            current: None,
        }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut state = self.state();
        data.iter().map(|&value| state.update(value)).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// Streaming RSI.
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    smoothing: RsiSmoothing,
    previous: Option<f64>,
    gains: RingBuffer,
    losses: RingBuffer,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
    current: Option<f64>,
}

impl RsiState {
    fn value(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss <= 0.0 {
            return 100.0;
        }
        let rs = avg_gain.max(0.0) / avg_loss;
        (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
    }
}

impl StreamingIndicator for RsiState {
    type Output = f64;

    fn update(&mut self, value: f64) -> Option<f64> {
        let previous = self.previous.replace(value)?;

        let change = value - previous;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        self.changes += 1;
        let period = self.period as f64;

        match self.smoothing {
            RsiSmoothing::Simple => {
                self.gains.push(gain);
                self.losses.push(loss);
                if self.changes < self.period {
                    return None;
                }
                self.avg_gain = self.gains.sum() / period;
                self.avg_loss = self.losses.sum() / period;
            }
            RsiSmoothing::Wilder => {
                if self.changes <= self.period {
                    // Seed with the simple average of the first window
                    self.gains.push(gain);
                    self.losses.push(loss);
                    if self.changes < self.period {
                        return None;
                    }
                    self.avg_gain = self.gains.sum() / period;
                    self.avg_loss = self.losses.sum() / period;
                } else {
                    self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
                    self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
                }
            }
        }

        self.current = Some(Self::value(self.avg_gain, self.avg_loss));
        self.current
    }

    fn current(&self) -> Option<f64> {
        self.current
    }

    fn reset(&mut self) {
        self.previous = None;
        self.gains.clear();
        self.losses.clear();
        self.changes = 0;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
        self.current = None;
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// MACD (Moving Average Convergence Divergence) output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// MACD line (fast EMA - slow EMA)
    pub macd: f64,
    /// Signal line (EMA of MACD)
    pub signal: f64,
    /// Histogram (MACD - Signal)
    pub histogram: f64,
}

/// MACD indicator.
///
/// Uses two EMAs to identify trend direction and momentum. Built on the
/// first-value-seeded EMA, so all three outputs are defined from index 0.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl Macd {
    /// Create a MACD with custom periods. Requires `fast < slow`.
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, ConfigError> {
        if fast >= slow {
            return Err(ConfigError::invalid(
                "fast",
                format!("fast period ({}) must be less than slow period ({})", fast, slow),
            ));
        }
        Ok(Self {
            fast: Ema::new(fast)?,
            slow: Ema::new(slow)?,
            signal: Ema::new(signal)?,
        })
    }

    /// The conventional (12, 26, 9) configuration.
    pub fn standard() -> Self {
        Self {
            fast: Ema::standard(12),
            slow: Ema::standard(26),
            signal: Ema::standard(9),
        }
    }

    /// Fresh incremental state for this MACD.
    pub fn state(&self) -> MacdState {
        MacdState {
            fast: self.fast.state(),
            slow: self.slow.state(),
            signal: self.signal.state(),
            current: None,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::standard()
    }
}

impl Indicator for Macd {
    type Output = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<Option<MacdOutput>> {
        let mut state = self.state();
        data.iter().map(|&value| state.update(value)).collect()
    }

    fn period(&self) -> usize {
        self.slow.period()
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

/// Streaming MACD.
#[derive(Debug, Clone)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    current: Option<MacdOutput>,
}

impl StreamingIndicator for MacdState {
    type Output = MacdOutput;

    fn update(&mut self, value: f64) -> Option<MacdOutput> {
        let fast = self.fast.update(value)?;
        let slow = self.slow.update(value)?;
        let macd = fast - slow;
        let signal = self.signal.update(macd)?;

        self.current = Some(MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        });
        self.current
    }

    fn current(&self) -> Option<MacdOutput> {
        self.current
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.current = None;
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    fn period(&self) -> usize {
        self.slow.period()
    }

    fn name(&self) -> &str {
        "MACD"
    }
}
