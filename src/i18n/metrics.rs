//! Resolver observability counters.
//!
//! Tracks cache effectiveness and backend health. Counters are process-wide
//! atomics; a serializable snapshot is served from the metrics endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Global translation metrics singleton.
pub struct TranslationMetrics {
    /// Resolver requests answered from the cache
    cache_hits: AtomicUsize,

    /// Resolver requests that had to call the backend
    cache_misses: AtomicUsize,

    /// Calls made to the translate backend
    backend_calls: AtomicUsize,

    /// Backend calls that failed
    backend_failures: AtomicUsize,

    /// Batch items that fell back to echoing the original text
    batch_fallbacks: AtomicUsize,
}

static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    /// Get the global metrics instance, initializing it on first access.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(|| TranslationMetrics {
            cache_hits: AtomicUsize::new(0),
            cache_misses: AtomicUsize::new(0),
            backend_calls: AtomicUsize::new(0),
            backend_failures: AtomicUsize::new(0),
            batch_fallbacks: AtomicUsize::new(0),
        })
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_call(&self) {
        self.backend_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_failure(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_fallback(&self) {
        self.batch_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn backend_calls(&self) -> usize {
        self.backend_calls.load(Ordering::Relaxed)
    }

    pub fn backend_failures(&self) -> usize {
        self.backend_failures.load(Ordering::Relaxed)
    }

    pub fn batch_fallbacks(&self) -> usize {
        self.batch_fallbacks.load(Ordering::Relaxed)
    }

    /// Snapshot the counters for reporting.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let lookups = hits + misses;
        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
            backend_calls: self.backend_calls(),
            backend_failures: self.backend_failures(),
            batch_fallbacks: self.batch_fallbacks(),
        }
    }
}

/// Point-in-time snapshot of the resolver counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_hit_rate: f64,
    pub backend_calls: usize,
    pub backend_failures: usize,
    pub batch_fallbacks: usize,
}
