//! Memoization of ranked search results.
//!
//! Ranking is deterministic for a given query, filter, result count and catalog
//! content, so results are cached on exactly that tuple. Entries expire after a TTL
//! and the least recently used entry is evicted when the cache is full.

use crate::search::ScoredEntry;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything a ranking result depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    top_k: usize,
    language: Option<String>,
    generation: u64,
}

impl CacheKey {
    /// The query text is used verbatim; the language filter is lowercased.
    pub fn new(query: &str, top_k: usize, language: Option<&str>, generation: u64) -> Self {
        Self {
            query: query.to_string(),
            top_k,
            language: language.map(str::to_lowercase),
            generation,
        }
    }
}

#[derive(Debug)]
struct CachedResults {
    results: Arc<Vec<ScoredEntry>>,
    inserted_at: Instant,
}

/// Counters reported by [`SearchCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// LRU cache of ranked results with a per-entry time to live.
#[derive(Debug)]
pub struct SearchCache {
    entries: LruCache<CacheKey, CachedResults, ahash::RandomState>,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl SearchCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::with_hasher(capacity, ahash::RandomState::new()),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached results for `key`, if present and not expired. Expired entries are evicted.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<Vec<ScoredEntry>>> {
        let expired = match self.entries.get(key) {
            Some(cached) if cached.inserted_at.elapsed() < self.ttl => {
                self.hits += 1;
                tracing::debug!(query = %key.query, "Search cache hit");
                return Some(Arc::clone(&cached.results));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.pop(key);
        }
        self.misses += 1;
        None
    }

    pub fn insert(&mut self, key: CacheKey, results: Arc<Vec<ScoredEntry>>) {
        self.entries.put(
            key,
            CachedResults {
                results,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
