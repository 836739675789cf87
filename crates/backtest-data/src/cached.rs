//! Caching wrapper around any [`DataSource`].

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use backtest_core::traits::{DataRequest, DataSource};
use backtest_core::{BarSeries, DataError};

use crate::cache::{CacheStats, DataCache};

/// Serves repeated requests from a [`DataCache`] and delegates misses.
///
/// The cache sits behind a mutex so one source can feed parallel sweeps.
/// Failed fetches are never cached.
#[derive(Debug)]
pub struct CachedDataSource<S> {
    inner: S,
    cache: Mutex<DataCache>,
    name: String,
}

impl<S: DataSource> CachedDataSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self::with_cache(inner, DataCache::new(ttl))
    }

    pub fn with_cache(inner: S, cache: DataCache) -> Self {
        let name = format!("cached({})", inner.name());
        Self {
            inner,
            cache: Mutex::new(cache),
            name,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn invalidate(&self, symbol: &str) -> Result<usize, DataError> {
        Ok(self.lock()?.invalidate(symbol))
    }

    pub fn clear(&self) -> Result<(), DataError> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats, DataError> {
        Ok(self.lock()?.stats())
    }

    fn lock(&self) -> Result<MutexGuard<'_, DataCache>, DataError> {
        self.cache
            .lock()
            .map_err(|_| DataError::CacheError("cache lock poisoned".to_string()))
    }
}

impl<S: DataSource> DataSource for CachedDataSource<S> {
    fn fetch(&self, request: &DataRequest) -> Result<BarSeries, DataError> {
        if let Some(series) = self.lock()?.get(request) {
            return Ok(series);
        }

        // Not holding the lock while the inner source loads.
        let series = self.inner.fetch(request)?;
        self.lock()?.insert(request.clone(), series.clone());
        Ok(series)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backtest_core::{Bar, Timeframe};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl DataSource for CountingSource {
        fn fetch(&self, request: &DataRequest) -> Result<BarSeries, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataError::SymbolNotFound(request.symbol.clone()));
            }
            let bars = vec![Bar::new(0, 10.0, 11.0, 9.0, 10.0, 1.0)];
            Ok(BarSeries::new(request.symbol.clone(), request.timeframe, bars))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_second_fetch_is_served_from_cache() {
        let source = CachedDataSource::new(CountingSource::new(false), Duration::from_secs(60));
        let request = DataRequest::new("AAPL", Timeframe::Daily);

        let first = source.fetch(&request).unwrap();
        let second = source.fetch(&request).unwrap();
        assert_eq!(first, second);
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.name(), "cached(counting)");

        let stats = source.stats().unwrap();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let source = CachedDataSource::new(CountingSource::new(false), Duration::from_secs(60));
        let request = DataRequest::new("AAPL", Timeframe::Daily);

        source.fetch(&request).unwrap();
        assert_eq!(source.invalidate("AAPL").unwrap(), 1);
        source.fetch(&request).unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let source = CachedDataSource::new(CountingSource::new(true), Duration::from_secs(60));
        let request = DataRequest::new("NOPE", Timeframe::Daily);

        assert!(source.fetch(&request).is_err());
        assert!(source.fetch(&request).is_err());
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.stats().unwrap().entries, 0);
    }
}
