// Request path — cache lookup, gated engine runs and result caching.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::cache::AuditCache;
use super::cancel::CancelHandle;
use super::gate::ConcurrencyGate;
use super::median::MedianAggregator;
use super::retry::RetryPolicy;
use super::runner::{AuditRunner, GatedRunner};
use super::stats::{AuditStats, StatsSnapshot};
use crate::audit::{AuditRequest, AuditResult};
use crate::config::OrchestratorConfig;
use crate::error::AuditError;
use crate::source::traits::AuditEngine;

enum Strategy {
    /// One retried run under a single gate acquisition.
    Single,
    /// Several retried runs, each acquiring the gate on its own.
    Median(MedianAggregator),
}

/// Owns the process-wide cache and gate and serves audit requests.
pub struct Orchestrator {
    cache: AuditCache,
    gate: Arc<ConcurrencyGate>,
    stats: Arc<AuditStats>,
    retry: Arc<RetryPolicy>,
    strategy: Strategy,
    cancel: CancelHandle,
}

impl Orchestrator {
    pub fn new(engine: Arc<dyn AuditEngine>, config: &OrchestratorConfig) -> Result<Self, AuditError> {
        config.validate()?;

        let stats = Arc::new(AuditStats::new());
        let gate = Arc::new(ConcurrencyGate::new(config.gate_poll_interval()));
        let retry = Arc::new(RetryPolicy::from_config(engine, config, stats.clone()));

        let strategy = match config.median_runs {
            Some(runs) => {
                let gated: Arc<dyn AuditRunner> =
                    Arc::new(GatedRunner::new(retry.clone(), gate.clone()));
                Strategy::Median(MedianAggregator::new(gated, runs))
            }
            None => Strategy::Single,
        };

        info!(
            "orchestrator ready: ttl_ms={} attempts={} backoff_ms={} median_runs={:?} timeout_ms={:?}",
            config.cache_ttl_ms,
            config.max_attempts,
            config.backoff_unit_ms,
            config.median_runs,
            config.attempt_timeout_ms
        );

        Ok(Self {
            cache: AuditCache::new(config.cache_ttl(), config.cache_capacity),
            gate,
            stats,
            retry,
            strategy,
            cancel: CancelHandle::new(),
        })
    }

    /// Validate raw caller input, then audit.
    pub async fn handle(
        &self,
        url: Option<&str>,
        device: Option<&str>,
    ) -> Result<AuditResult, AuditError> {
        let request = AuditRequest::parse(url, device).map_err(|e| {
            debug!("rejected audit request: {}", e);
            e
        })?;
        self.audit(&request).await
    }

    /// Serve `request` from the cache or run the engine.
    ///
    /// Identical requests that miss at the same time both run the engine;
    /// there is no in-flight de-duplication.
    pub async fn audit(&self, request: &AuditRequest) -> Result<AuditResult, AuditError> {
        let AuditRequest { url, device } = request;

        if let Some(hit) = self.cache.get(url, *device) {
            self.stats.record_cache_hit();
            info!("cache hit url={} device={}", url, device);
            return Ok(hit);
        }
        self.stats.record_cache_miss();

        let t0 = Instant::now();
        let outcome = match &self.strategy {
            Strategy::Single => {
                let _guard = self.gate.acquire().await;
                debug!("gate held for url={} device={}", url, device);
                let outcome = self.retry.invoke(url, *device).await;
                if let Ok(result) = &outcome {
                    self.cache.put(url, *device, result.clone());
                }
                outcome
            }
            Strategy::Median(median) => {
                // Each run released the gate on its own; the entry lands after the last release.
                let outcome = median.invoke(url, *device).await;
                if let Ok(result) = &outcome {
                    self.cache.put(url, *device, result.clone());
                }
                outcome
            }
        };

        self.stats.record_audit(outcome.is_ok());
        match &outcome {
            Ok(result) => info!(
                "audit done url={} device={} performance={} elapsed_ms={}",
                url,
                device,
                result.performance,
                t0.elapsed().as_millis()
            ),
            Err(e) => warn!("audit failed url={} device={}: {}", url, device, e),
        }
        outcome
    }

    /// No-op cancellation hook; see [`CancelHandle`].
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn cache(&self) -> &AuditCache {
        &self.cache
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }
}
