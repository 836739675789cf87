//! Bar sources and caching.
//!
//! Sources implement [`backtest_core::traits::DataSource`]; wrap any of them
//! in a [`CachedDataSource`] to reuse loaded series across runs.

mod cache;
mod cached;
mod csv_source;

pub use cache::{CacheStats, DataCache, DEFAULT_TTL};
pub use cached::CachedDataSource;
pub use csv_source::{parse_timestamp, CsvDataSource};

use std::path::Path;
use std::time::Duration;

use backtest_core::traits::{DataRequest, DataSource};
use backtest_core::{BarSeries, DataError};

/// Load one symbol from a CSV file or directory.
pub fn load_csv(path: impl AsRef<Path>, request: &DataRequest) -> Result<BarSeries, DataError> {
    CsvDataSource::new(path)?.fetch(request)
}

/// CSV source behind a cache with the given TTL.
pub fn cached_csv(
    path: impl AsRef<Path>,
    ttl: Duration,
) -> Result<CachedDataSource<CsvDataSource>, DataError> {
    Ok(CachedDataSource::new(CsvDataSource::new(path)?, ttl))
}
