//! In-memory TTL cache for gas price quotes.
//!
//! One entry per chain ID, shared across callers. Single-process only;
//! cleared on restart. Reads and writes go through `DashMap` so no caller
//! ever observes a partially written entry.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::quote::GasPriceQuote;

/// Default freshness window for cached quotes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    quote: GasPriceQuote,
    fetched_at: Instant,
}

/// Cache introspection snapshot for tests and operations tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries.
    pub size: usize,
    /// Chain IDs with a cached entry, unordered.
    pub chain_ids: Vec<u64>,
}

/// TTL cache keyed by numeric chain ID.
#[derive(Debug)]
pub struct GasPriceCache {
    entries: DashMap<u64, CacheEntry>,
    ttl: Duration,
}

impl GasPriceCache {
    /// Creates a cache with the given freshness window.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached quote for `chain_id` if it is still fresh.
    #[must_use]
    pub fn fresh(&self, chain_id: u64) -> Option<GasPriceQuote> {
        self.entries.get(&chain_id).and_then(|entry| {
            (entry.fetched_at.elapsed() < self.ttl).then(|| entry.quote.clone())
        })
    }

    /// Stores a quote for `chain_id`, stamped with the current time.
    pub fn store(&self, chain_id: u64, quote: GasPriceQuote) {
        self.entries.insert(
            chain_id,
            CacheEntry {
                quote,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Snapshot of cache size and keys.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let chain_ids: Vec<u64> = self.entries.iter().map(|e| *e.key()).collect();
        CacheStats {
            size: chain_ids.len(),
            chain_ids,
        }
    }
}

impl Default for GasPriceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
