// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Result Cache
//!
//! Short-lived cache of whole result pages, keyed by the normalized request
//! itself. Requests keep their filters in ordered sets, so
//! `?project=a&project=b` and `?project=b&project=a` share an entry, and two
//! different requests never share one even if their hashes collide.
//!
//! # Flow
//!
//! ```text
//! Search request arrives
//!       │
//!       ▼
//! ┌─────────────────────────────┐
//! │  Cache lookup               │
//! │  key = (entity, request)    │
//! │  check: age < ttl?          │
//! └─────────────────────────────┘
//!       │
//!       ├─→ Hit + fresh → return cached page
//!       │
//!       └─→ Miss OR stale → query store, cache page
//! ```
//!
//! Entries are bounded by `max_entries` with oldest-first eviction. Writers
//! that need read-your-writes call [`SearchCache::clear`].

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::entity::EntityKind;

/// Cache key: (entity, request)
type CacheKey<K> = (EntityKind, K);

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    inserted_at: Instant,
    value: V,
}

/// Bounded, time-limited search result cache
pub struct SearchCache<K, V> {
    cache: DashMap<CacheKey<K>, CacheEntry<V>>,
    /// Insertion order for eviction (oldest first)
    order: Mutex<VecDeque<CacheKey<K>>>,
    max_entries: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Entries found but older than the ttl
    stale: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct SearchCacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of stale entries (older than ttl)
    pub stale: u64,
    /// Current number of entries
    pub entry_count: usize,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

impl<K: Hash + Eq + Clone, V: Clone> SearchCache<K, V> {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            cache: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            max_entries,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
        }
    }

    /// Cached value for a request, if present and younger than the ttl.
    pub fn get(&self, kind: EntityKind, request: &K) -> Option<V> {
        let key = (kind, request.clone());

        if let Some(entry) = self.cache.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            self.stale.fetch_add(1, Ordering::Relaxed);
            drop(entry); // Release read lock before removing
            self.cache.remove(&key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, kind: EntityKind, request: &K, value: V) {
        if self.max_entries == 0 {
            return;
        }
        let key = (kind, request.clone());

        // Evict oldest if at capacity
        if self.cache.len() >= self.max_entries && !self.cache.contains_key(&key) {
            let mut order = self.order.lock();
            while self.cache.len() >= self.max_entries {
                match order.pop_front() {
                    Some(old_key) => {
                        self.cache.remove(&old_key);
                    }
                    None => break,
                }
            }
        }

        let entry = CacheEntry {
            inserted_at: Instant::now(),
            value,
        };
        if self.cache.insert(key.clone(), entry).is_none() {
            let mut order = self.order.lock();
            // A stale removal may have left the key queued already
            if !order.contains(&key) {
                order.push_back(key);
            }
        }
    }

    pub fn stats(&self) -> SearchCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        SearchCacheStats {
            hits,
            misses,
            stale: self.stale.load(Ordering::Relaxed),
            entry_count: self.cache.len(),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
        self.order.lock().clear();
    }
}
