// Bounded retry around single engine attempts, with linear backoff and a
// per-attempt deadline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::runner::AuditRunner;
use super::stats::AuditStats;
use crate::audit::{AuditResult, DeviceProfile};
use crate::config::{
    OrchestratorConfig, DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_BACKOFF_UNIT_MS, DEFAULT_MAX_ATTEMPTS,
};
use crate::error::{AuditError, EngineError};
use crate::source::traits::AuditEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Progress of one retried audit.
#[derive(Debug)]
pub struct Job {
    attempt: u32,
    max_attempts: u32,
    state: JobState,
}

impl Job {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            state: JobState::Pending,
        }
    }

    /// Enter `Running` for the next attempt.
    pub fn start(&mut self) -> u32 {
        debug_assert!(matches!(self.state, JobState::Pending | JobState::Failed));
        self.attempt += 1;
        self.state = JobState::Running;
        self.attempt
    }

    pub fn succeed(&mut self) {
        self.state = JobState::Succeeded;
    }

    /// Record a failed attempt. Returns whether another attempt is allowed.
    pub fn fail(&mut self) -> bool {
        self.state = JobState::Failed;
        self.attempt < self.max_attempts
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn state(&self) -> JobState {
        self.state
    }
}

pub struct RetryPolicy {
    engine: Arc<dyn AuditEngine>,
    stats: Arc<AuditStats>,
    max_attempts: u32,
    backoff_unit: Duration,
    attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(engine: Arc<dyn AuditEngine>) -> Self {
        Self {
            engine,
            stats: Arc::new(AuditStats::new()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_millis(DEFAULT_BACKOFF_UNIT_MS),
            attempt_timeout: Some(Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS)),
        }
    }

    pub fn from_config(
        engine: Arc<dyn AuditEngine>,
        config: &OrchestratorConfig,
        stats: Arc<AuditStats>,
    ) -> Self {
        Self {
            engine,
            stats,
            max_attempts: config.max_attempts.max(1),
            backoff_unit: config.backoff_unit(),
            attempt_timeout: config.attempt_timeout(),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Run the engine until it yields a usable result or attempts run out.
    ///
    /// After failed attempt `n` (with attempts remaining) the policy waits
    /// `n * backoff_unit` before the next one.
    pub async fn invoke(&self, url: &str, device: DeviceProfile) -> Result<AuditResult, AuditError> {
        let mut job = Job::new(self.max_attempts);

        loop {
            let attempt = job.start();
            debug!(
                "{} attempt {}/{} url={} device={}",
                self.engine.name(),
                attempt,
                self.max_attempts,
                url,
                device
            );

            let err = match self.attempt(url, device).await {
                Ok(result) => {
                    job.succeed();
                    if attempt > 1 {
                        info!(
                            "audit succeeded on attempt {} url={} device={}",
                            attempt, url, device
                        );
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            if !job.fail() {
                warn!(
                    "audit giving up after {} attempts url={} device={}: {}",
                    attempt, url, device, err
                );
                return Err(AuditError::AuditFailed {
                    device,
                    attempts: attempt,
                    last_error: err.to_string(),
                });
            }

            let delay = self.backoff_unit * attempt;
            warn!(
                "audit attempt {} failed url={} device={}: {} (retrying in {}ms)",
                attempt,
                url,
                device,
                err,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One fresh engine invocation, bounded by the attempt deadline.
    async fn attempt(&self, url: &str, device: DeviceProfile) -> Result<AuditResult, EngineError> {
        let tracker = self.stats.begin_attempt();

        let run = self.engine.run(url, device);
        let raw = match self.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(raw) => raw,
                Err(_) => Err(EngineError::Timeout(limit)),
            },
            None => run.await,
        }?;

        let result = AuditResult::from_raw(&raw)?;
        tracker.succeeded();
        Ok(result)
    }
}

#[async_trait]
impl AuditRunner for RetryPolicy {
    async fn run(&self, url: &str, device: DeviceProfile) -> Result<AuditResult, AuditError> {
        self.invoke(url, device).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standalone_policy_has_default_deadline() {
        use crate::source::traits::AuditEngine;

        struct Unused;

        #[async_trait]
        impl AuditEngine for Unused {
            async fn run(
                &self,
                _url: &str,
                _device: DeviceProfile,
            ) -> Result<crate::audit::RawAudit, EngineError> {
                Err(EngineError::Navigation("unused".into()))
            }
        }

        let policy = RetryPolicy::new(Arc::new(Unused));
        assert_eq!(
            policy.attempt_timeout,
            Some(Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS))
        );
        let policy = policy.with_attempt_timeout(None);
        assert_eq!(policy.attempt_timeout, None);
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = Job::new(2);
        assert_eq!(job.state(), JobState::Pending);

        assert_eq!(job.start(), 1);
        assert_eq!(job.state(), JobState::Running);
        assert!(job.fail());
        assert_eq!(job.state(), JobState::Failed);

        assert_eq!(job.start(), 2);
        assert!(!job.fail());

        let mut job = Job::new(3);
        job.start();
        job.succeed();
        assert_eq!(job.state(), JobState::Succeeded);
        assert_eq!(job.attempt(), 1);
    }
}
