//! Moving average indicators.

use backtest_core::traits::{Indicator, StreamingIndicator};
use backtest_core::ConfigError;

use crate::buffer::RingBuffer;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values. Undefined for the
/// first `period - 1` inputs.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::invalid("period", "must be greater than 0"));
        }
        Ok(Self { period })
    }

    /// Fresh incremental state for this SMA.
    pub fn state(&self) -> SmaState {
        SmaState {
            window: RingBuffer::new(self.period),
            current: None,
        }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut state = self.state();
        data.iter().map(|&value| state.update(value)).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Streaming SMA backed by a ring buffer.
#[derive(Debug, Clone)]
pub struct SmaState {
    window: RingBuffer,
    current: Option<f64>,
}

impl StreamingIndicator for SmaState {
    type Output = f64;

    fn update(&mut self, value: f64) -> Option<f64> {
        self.window.push(value);
        self.current = if self.window.is_full() {
            self.window.mean()
        } else {
            None
        };
        self.current
    }

    fn current(&self) -> Option<f64> {
        self.current
    }

    fn reset(&mut self) {
        self.window.clear();
        self.current = None;
    }

    fn is_ready(&self) -> bool {
        self.window.is_full()
    }

    fn period(&self) -> usize {
        self.window.capacity()
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA).
///
/// Seeded with the first input and defined from index 0:
/// `ema[0] = x[0]`, `ema[t] = alpha * x[t] + (1 - alpha) * ema[t-1]`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
}

impl Ema {
    /// Create a new EMA with the default smoothing `2 / (period + 1)`.
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::invalid("period", "must be greater than 0"));
        }
        Ok(Self::standard(period))
    }

    /// EMA with a period known to be valid.
    pub(crate) fn standard(period: usize) -> Self {
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
        }
    }

    /// Create an EMA with a custom smoothing factor in (0, 1].
    pub fn with_smoothing(period: usize, alpha: f64) -> Result<Self, ConfigError> {
        let mut ema = Self::new(period)?;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::invalid(
                "smoothing",
                format!("must be in (0, 1], got {}", alpha),
            ));
        }
        ema.alpha = alpha;
        Ok(ema)
    }

    /// Smoothing factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fresh incremental state for this EMA.
    pub fn state(&self) -> EmaState {
        EmaState {
            period: self.period,
            alpha: self.alpha,
            current: None,
        }
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut state = self.state();
        data.iter().map(|&value| state.update(value)).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Streaming EMA that maintains state for incremental updates.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    alpha: f64,
    current: Option<f64>,
}

impl StreamingIndicator for EmaState {
    type Output = f64;

    fn update(&mut self, value: f64) -> Option<f64> {
        let next = match self.current {
            None => value,
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
        };
        self.current = Some(next);
        self.current
    }

    fn current(&self) -> Option<f64> {
        self.current
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let sma = Sma::new(3).unwrap();
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma.calculate(&data);

        assert_eq!(result.len(), 5);
        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert!((result[2].unwrap() - 2.0).abs() < 1e-10); // (1+2+3)/3
        assert!((result[3].unwrap() - 3.0).abs() < 1e-10); // (2+3+4)/3
        assert!((result[4].unwrap() - 4.0).abs() < 1e-10); // (3+4+5)/3
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(5).unwrap();
        let result = sma.calculate(&[1.0, 2.0, 3.0]);

        assert_eq!(result, vec![None, None, None]);
    }

    #[test]
    fn test_sma_period_one_is_identity() {
        let sma = Sma::new(1).unwrap();
        let result = sma.calculate(&[4.0, 5.0, 6.0]);
        assert_eq!(result, vec![Some(4.0), Some(5.0), Some(6.0)]);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(Sma::new(0).is_err());
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn test_ema() {
        let ema = Ema::new(3).unwrap();
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema.calculate(&data);

        assert_eq!(result.len(), 5);
        // Seeded with the first value
        assert!((result[0].unwrap() - 1.0).abs() < 1e-10);
        // alpha = 2/(3+1) = 0.5
        assert!((result[1].unwrap() - 1.5).abs() < 1e-10);
        assert!((result[2].unwrap() - 2.25).abs() < 1e-10);
    }

    #[test]
    fn test_ema_constant_series() {
        let ema = Ema::new(2).unwrap();
        let result = ema.calculate(&[5.0; 5]);
        assert!(result.iter().all(|v| (v.unwrap() - 5.0).abs() < 1e-10));
    }

    #[test]
    fn test_ema_custom_smoothing() {
        let ema = Ema::with_smoothing(10, 1.0).unwrap();
        let result = ema.calculate(&[3.0, 7.0, 2.0]);
        assert_eq!(result, vec![Some(3.0), Some(7.0), Some(2.0)]);

        assert!(Ema::with_smoothing(10, 0.0).is_err());
        assert!(Ema::with_smoothing(10, 1.5).is_err());
        assert!(Ema::with_smoothing(10, f64::NAN).is_err());
    }

    #[test]
    fn test_streaming_sma_matches_batch() {
        let data: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let sma = Sma::new(7).unwrap();
        let batch = sma.calculate(&data);

        let mut state = sma.state();
        for (i, &v) in data.iter().enumerate() {
            assert_eq!(state.update(v), batch[i]);
        }
        assert!(state.is_ready());
    }

    #[test]
    fn test_streaming_ema_reset() {
        let mut state = Ema::new(3).unwrap().state();
        state.update(1.0);
        state.update(2.0);

        assert!(state.is_ready());
        state.reset();
        assert!(!state.is_ready());
        assert!(state.current().is_none());
        assert_eq!(state.update(9.0), Some(9.0));
    }
}
