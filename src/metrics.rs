// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the search service.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding process is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `labor_market_search_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `entity`: marketplace, challenge, submission, review
//! - `operation`: search, count, find
//! - `status`: success, invalid, not_found, error

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record one service call and how it ended
pub fn record_query(entity: &str, operation: &str, status: &str) {
    counter!(
        "labor_market_search_queries_total",
        "entity" => entity.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record store round-trip latency
pub fn record_latency(entity: &str, operation: &str, duration: Duration) {
    histogram!(
        "labor_market_search_query_seconds",
        "entity" => entity.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record page size returned and total matches
pub fn record_results(entity: &str, items: usize, total: u64) {
    histogram!(
        "labor_market_search_page_items",
        "entity" => entity.to_string()
    )
    .record(items as f64);
    histogram!(
        "labor_market_search_total_matches",
        "entity" => entity.to_string()
    )
    .record(total as f64);
}

/// Record search cache hit/miss
pub fn record_cache(entity: &str, hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!(
        "labor_market_search_cache_total",
        "entity" => entity.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Set search cache stats gauge
pub fn set_cache_stats(entries: usize, hit_rate: f64) {
    gauge!("labor_market_search_cache_entries").set(entries as f64);
    gauge!("labor_market_search_cache_hit_rate").set(hit_rate);
}

/// Record rows written by the seeding tool
pub fn record_seeded(entity: &str, count: usize) {
    counter!(
        "labor_market_search_seeded_total",
        "entity" => entity.to_string()
    )
    .increment(count as u64);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    entity: &'static str,
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(entity: &'static str, operation: &'static str) -> Self {
        Self {
            entity,
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.entity, self.operation, self.start.elapsed());
    }
}
