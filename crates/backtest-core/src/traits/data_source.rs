//! Data source trait definitions.

use crate::error::DataError;
use crate::types::{BarSeries, Timeframe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What to load: a symbol, a timeframe and an optional inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DataRequest {
    /// Request the full history of a symbol.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            start: None,
            end: None,
        }
    }

    /// Restrict the request to `[start, end]`.
    pub fn with_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Start of the range in Unix milliseconds.
    pub fn start_millis(&self) -> Option<i64> {
        self.start.map(|d| d.timestamp_millis())
    }

    /// End of the range in Unix milliseconds.
    pub fn end_millis(&self) -> Option<i64> {
        self.end.map(|d| d.timestamp_millis())
    }
}

/// Trait for historical data sources.
///
/// The engine only consumes validated [`BarSeries`]; sources are injected so
/// callers can wrap them (e.g. with a cache).
pub trait DataSource: Send + Sync {
    /// Load bars for a request, oldest first.
    fn fetch(&self, request: &DataRequest) -> Result<BarSeries, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
