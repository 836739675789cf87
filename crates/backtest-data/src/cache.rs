//! In-memory bar cache with time-based expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use backtest_core::traits::DataRequest;
use backtest_core::BarSeries;
use serde::Serialize;
use tracing::{debug, info};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    series: BarSeries,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries currently stored, expired or not
    pub entries: usize,
    /// Bars held across all entries
    pub bars: usize,
}

/// Bar series keyed by request (symbol, timeframe, start, end).
///
/// Expired entries are dropped lazily on lookup, or eagerly with
/// [`DataCache::purge_expired`].
#[derive(Debug, Clone)]
pub struct DataCache {
    ttl: Duration,
    entries: HashMap<DataRequest, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl DataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached series for `request`, if present and fresh.
    pub fn get(&mut self, request: &DataRequest) -> Option<BarSeries> {
        let now = Instant::now();
        match self.entries.get(request) {
            Some(entry) if !entry.is_expired(now) => {
                self.hits += 1;
                debug!(symbol = %request.symbol, timeframe = %request.timeframe, "Cache hit");
                Some(entry.series.clone())
            }
            Some(_) => {
                self.entries.remove(request);
                self.misses += 1;
                debug!(symbol = %request.symbol, "Cache entry expired");
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `series` with the default TTL.
    pub fn insert(&mut self, request: DataRequest, series: BarSeries) {
        let ttl = self.ttl;
        self.insert_with_ttl(request, series, ttl);
    }

    pub fn insert_with_ttl(&mut self, request: DataRequest, series: BarSeries, ttl: Duration) {
        debug!(symbol = %request.symbol, bars = series.len(), ttl_secs = ttl.as_secs(), "Cached series");
        self.entries.insert(
            request,
            CacheEntry {
                series,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry for `symbol`. Returns how many were removed.
    pub fn invalidate(&mut self, symbol: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.symbol != symbol);
        let removed = before - self.entries.len();
        debug!(symbol, removed, "Invalidated cache entries");
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        info!("Data cache cleared");
    }

    /// Remove expired entries. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            bars: self.entries.values().map(|e| e.series.len()).sum(),
        }
    }
}
