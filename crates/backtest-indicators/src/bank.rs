//! Streams a set of indicator specs bar by bar.

use backtest_core::traits::StreamingIndicator;
use backtest_core::{Bar, ConfigError, IndicatorFrame, IndicatorSpec, MacdComponent};

use crate::momentum::{Macd, MacdState, Rsi, RsiState};
use crate::moving_average::{Ema, EmaState, Sma, SmaState};

#[derive(Debug, Clone)]
enum Stream {
    Sma(SmaState),
    Ema(EmaState),
    Rsi(RsiState),
    Macd(MacdState, MacdComponent),
}

impl Stream {
    fn from_spec(spec: &IndicatorSpec) -> Result<Self, ConfigError> {
        Ok(match *spec {
            IndicatorSpec::Sma { period } => Stream::Sma(Sma::new(period)?.state()),
            IndicatorSpec::Ema { period, smoothing } => {
                let ema = match smoothing {
                    Some(alpha) => Ema::with_smoothing(period, alpha)?,
                    None => Ema::new(period)?,
                };
                Stream::Ema(ema.state())
            }
            IndicatorSpec::Rsi { period, smoothing } => {
                Stream::Rsi(Rsi::with_smoothing(period, smoothing)?.state())
            }
            IndicatorSpec::Macd {
                fast,
                slow,
                signal,
                component,
            } => Stream::Macd(Macd::new(fast, slow, signal)?.state(), component),
        })
    }

    fn update(&mut self, close: f64) -> Option<f64> {
        match self {
            Stream::Sma(state) => state.update(close),
            Stream::Ema(state) => state.update(close),
            Stream::Rsi(state) => state.update(close),
            Stream::Macd(state, component) => state.update(close).map(|out| match component {
                MacdComponent::Line => out.macd,
                MacdComponent::Signal => out.signal,
                MacdComponent::Histogram => out.histogram,
            }),
        }
    }

    fn reset(&mut self) {
        match self {
            Stream::Sma(state) => state.reset(),
            Stream::Ema(state) => state.reset(),
            Stream::Rsi(state) => state.reset(),
            Stream::Macd(state, _) => state.reset(),
        }
    }
}

/// Incremental state for every indicator a strategy needs.
///
/// Each call to [`IndicatorBank::update`] appends exactly one value (or
/// `None`) per series, so the frame stays aligned with the bars seen so far.
#[derive(Debug, Clone)]
pub struct IndicatorBank {
    streams: Vec<(usize, Stream)>,
    frame: IndicatorFrame,
}

impl IndicatorBank {
    /// Build one state per distinct spec. Invalid parameters fail here.
    pub fn new(specs: &[IndicatorSpec]) -> Result<Self, ConfigError> {
        let mut frame = IndicatorFrame::new();
        let mut streams = Vec::with_capacity(specs.len());

        for spec in specs {
            if frame.get(spec).is_some() {
                continue;
            }
            let stream = Stream::from_spec(spec)?;
            let slot = frame.register(*spec);
            streams.push((slot, stream));
        }

        Ok(Self { streams, frame })
    }

    /// Feed the next bar's close to every indicator.
    pub fn update(&mut self, bar: &Bar) {
        for (slot, stream) in &mut self.streams {
            let value = stream.update(bar.close);
            self.frame.push(*slot, value);
        }
    }

    /// Series computed so far.
    pub fn frame(&self) -> &IndicatorFrame {
        &self.frame
    }

    /// Number of distinct indicators.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Clear all state and values, keeping the specs.
    pub fn reset(&mut self) {
        for (_, stream) in &mut self.streams {
            stream.reset();
        }
        self.frame.clear_values();
    }

    /// Compute every spec over a whole bar slice at once.
    pub fn compute(specs: &[IndicatorSpec], bars: &[Bar]) -> Result<IndicatorFrame, ConfigError> {
        let mut bank = Self::new(specs)?;
        for bar in bars {
            bank.update(bar);
        }
        Ok(bank.frame)
    }
}
