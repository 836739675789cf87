//! OHLCV (Open, High, Low, Close, Volume) data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Timeframe;
use crate::error::DataError;

/// Compact OHLCV bar.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Opening price as a decimal. Zero if the price is not representable,
    /// which validated series rule out.
    #[inline]
    pub fn open_decimal(&self) -> Decimal {
        Decimal::try_from(self.open).unwrap_or_default()
    }

    /// Closing price as a decimal.
    #[inline]
    pub fn close_decimal(&self) -> Decimal {
        Decimal::try_from(self.close).unwrap_or_default()
    }

    /// Highest price as a decimal.
    #[inline]
    pub fn high_decimal(&self) -> Decimal {
        Decimal::try_from(self.high).unwrap_or_default()
    }

    /// Lowest price as a decimal.
    #[inline]
    pub fn low_decimal(&self) -> Decimal {
        Decimal::try_from(self.low).unwrap_or_default()
    }

    /// Check a single bar for missing or impossible values.
    fn check(&self, index: usize) -> Result<(), DataError> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];

        for (field, value) in prices {
            if !value.is_finite() || value <= 0.0 || Decimal::try_from(value).is_err() {
                return Err(DataError::InvalidField {
                    index,
                    timestamp: self.timestamp,
                    field,
                    value,
                });
            }
        }

        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(DataError::InvalidField {
                index,
                timestamp: self.timestamp,
                field: "volume",
                value: self.volume,
            });
        }

        if self.high < self.low {
            return Err(DataError::InconsistentRange {
                index,
                timestamp: self.timestamp,
                field: "high",
            });
        }
        for (field, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(DataError::InconsistentRange {
                    index,
                    timestamp: self.timestamp,
                    field,
                });
            }
        }

        Ok(())
    }
}

/// Ordered, immutable price history for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// Symbol identifier
    pub symbol: String,
    /// Timeframe of the bars
    pub timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Create a series without validating it.
    ///
    /// The engine validates every series before a run; use [`BarSeries::try_new`]
    /// to fail early.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    /// Create a series and validate it.
    pub fn try_new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, DataError> {
        let series = Self::new(symbol, timeframe, bars);
        series.validate()?;
        Ok(series)
    }

    /// Validate ordering and field values of every bar.
    ///
    /// Timestamps must be strictly increasing, prices finite and positive,
    /// volume finite and non-negative, and open/close inside [low, high].
    pub fn validate(&self) -> Result<(), DataError> {
        if self.bars.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: self.symbol.clone(),
            });
        }

        let mut previous: Option<i64> = None;
        for (index, bar) in self.bars.iter().enumerate() {
            if let Some(prev) = previous {
                if bar.timestamp == prev {
                    return Err(DataError::DuplicateTimestamp {
                        index,
                        timestamp: bar.timestamp,
                    });
                }
                if bar.timestamp < prev {
                    return Err(DataError::NonMonotonicTimestamp {
                        index,
                        timestamp: bar.timestamp,
                        previous: prev,
                    });
                }
            }
            bar.check(index)?;
            previous = Some(bar.timestamp);
        }

        Ok(())
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bars with `start <= timestamp <= end` (Unix milliseconds).
    pub fn between(&self, start: Option<i64>, end: Option<i64>) -> Self {
        let bars = self
            .bars
            .iter()
            .filter(|b| start.map_or(true, |s| b.timestamp >= s))
            .filter(|b| end.map_or(true, |e| b.timestamp <= e))
            .copied()
            .collect();
        Self::new(self.symbol.clone(), self.timeframe, bars)
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar::new(ts, close, close + 1.0, close - 1.0, close, 1000.0)
    }

    #[test]
    fn test_valid_series() {
        let series = BarSeries::try_new(
            "AAPL",
            Timeframe::Daily,
            vec![bar(1, 100.0), bar(2, 101.0), bar(3, 102.0)],
        );
        assert!(series.is_ok());
        assert_eq!(series.unwrap().closes(), vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_empty_series_rejected() {
        let series = BarSeries::new("AAPL", Timeframe::Daily, vec![]);
        assert!(matches!(
            series.validate(),
            Err(DataError::EmptySeries { .. })
        ));
    }

    #[test]
    fn test_out_of_order_timestamps() {
        let series = BarSeries::new(
            "AAPL",
            Timeframe::Daily,
            vec![bar(1, 100.0), bar(3, 101.0), bar(2, 102.0)],
        );
        assert_eq!(
            series.validate(),
            Err(DataError::NonMonotonicTimestamp {
                index: 2,
                timestamp: 2,
                previous: 3,
            })
        );
    }

    #[test]
    fn test_duplicate_timestamps() {
        let series = BarSeries::new("AAPL", Timeframe::Daily, vec![bar(1, 100.0), bar(1, 101.0)]);
        assert_eq!(
            series.validate(),
            Err(DataError::DuplicateTimestamp {
                index: 1,
                timestamp: 1,
            })
        );
    }

    #[test]
    fn test_missing_close_reported_with_field() {
        let mut broken = bar(2, 101.0);
        broken.close = f64::NAN;
        let series = BarSeries::new("AAPL", Timeframe::Daily, vec![bar(1, 100.0), broken]);

        match series.validate() {
            Err(DataError::InvalidField { index, field, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "close");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_close_outside_range() {
        let broken = Bar::new(1, 100.0, 101.0, 99.0, 105.0, 10.0);
        let series = BarSeries::new("AAPL", Timeframe::Daily, vec![broken]);
        assert!(matches!(
            series.validate(),
            Err(DataError::InconsistentRange { field: "close", .. })
        ));
    }

    #[test]
    fn test_between_filters_inclusive() {
        let series = BarSeries::new(
            "AAPL",
            Timeframe::Daily,
            (1..=5).map(|i| bar(i, 100.0 + i as f64)).collect(),
        );
        let window = series.between(Some(2), Some(4));
        assert_eq!(window.len(), 3);
        assert_eq!(window.get(0).unwrap().timestamp, 2);
    }

    #[test]
    fn test_decimal_prices() {
        let b = Bar::new(1, 10.5, 11.0, 10.0, 10.75, 0.0);
        assert_eq!(b.open_decimal().to_string(), "10.5");
        assert_eq!(b.close_decimal().to_string(), "10.75");
    }
}
