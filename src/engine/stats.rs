// Live counters — cache effectiveness, engine attempts and in-flight invocations.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub engine_attempts: u64,
    pub engine_failures: u64,
    pub audits_completed: u64,
    pub audits_failed: u64,
    pub in_flight: u32,
    pub peak_in_flight: u32,
}

#[derive(Debug, Default)]
pub struct AuditStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    engine_attempts: AtomicU64,
    engine_failures: AtomicU64,
    audits_completed: AtomicU64,
    audits_failed: AtomicU64,
    in_flight: AtomicU32,
    peak_in_flight: AtomicU32,
}

impl AuditStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one engine attempt and track it as in flight until the returned
    /// guard is dropped. Attempts not marked successful count as failures.
    pub fn begin_attempt(&self) -> AttemptGuard<'_> {
        self.engine_attempts.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
        AttemptGuard {
            stats: self,
            succeeded: false,
        }
    }

    pub fn record_audit(&self, ok: bool) {
        if ok {
            self.audits_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.audits_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let cache_hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        StatsSnapshot {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            engine_attempts: self.engine_attempts.load(Ordering::Relaxed),
            engine_failures: self.engine_failures.load(Ordering::Relaxed),
            audits_completed: self.audits_completed.load(Ordering::Relaxed),
            audits_failed: self.audits_failed.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Acquire),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
        }
    }
}

pub struct AttemptGuard<'a> {
    stats: &'a AuditStats,
    succeeded: bool,
}

impl AttemptGuard<'_> {
    pub fn succeeded(mut self) {
        self.succeeded = true;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::AcqRel);
        if !self.succeeded {
            self.stats.engine_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}
