use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::runner::AuditRunner;
use crate::audit::{AuditResult, DeviceProfile};
use crate::config::DEFAULT_MEDIAN_RUNS;
use crate::error::AuditError;

/// Samples the runner several times and keeps one representative run.
pub struct MedianAggregator {
    runner: Arc<dyn AuditRunner>,
    runs: usize,
}

impl MedianAggregator {
    pub fn new(runner: Arc<dyn AuditRunner>, runs: usize) -> Self {
        Self {
            runner,
            runs: runs.max(1),
        }
    }

    pub fn with_default_runs(runner: Arc<dyn AuditRunner>) -> Self {
        Self::new(runner, DEFAULT_MEDIAN_RUNS)
    }

    /// Run sequentially `runs` times, then pick by performance score.
    ///
    /// The first failed run fails the whole aggregation.
    pub async fn invoke(&self, url: &str, device: DeviceProfile) -> Result<AuditResult, AuditError> {
        let mut results = Vec::with_capacity(self.runs);
        for run in 1..=self.runs {
            let result = self.runner.run(url, device).await?;
            debug!(
                "median run {}/{} url={} device={} performance={}",
                run, self.runs, url, device, result.performance
            );
            results.push(result);
        }

        let selected = select_median(results).ok_or_else(|| {
            AuditError::Orchestration("median aggregation produced no runs".to_string())
        })?;
        info!(
            "median of {} runs url={} device={} performance={}",
            self.runs, url, device, selected.performance
        );
        Ok(selected)
    }
}

#[async_trait]
impl AuditRunner for MedianAggregator {
    async fn run(&self, url: &str, device: DeviceProfile) -> Result<AuditResult, AuditError> {
        self.invoke(url, device).await
    }
}

/// Sort by performance, highest first, and take index `len / 2`.
///
/// For an even count this is the lower of the two middle runs; no averaging.
pub fn select_median(mut results: Vec<AuditResult>) -> Option<AuditResult> {
    if results.is_empty() {
        return None;
    }
    results.sort_by(|a, b| b.performance.cmp(&a.performance));
    let index = results.len() / 2;
    Some(results.swap_remove(index))
}
