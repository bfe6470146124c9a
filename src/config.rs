use std::time::Duration;

use serde::Deserialize;

use crate::error::AuditError;

/// How long a cached audit result stays valid (1 hour).
pub const DEFAULT_CACHE_TTL_MS: u64 = 3_600_000;

/// Attempts made against the engine before an audit is reported as failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Linear backoff unit: the wait after attempt `n` is `n * unit`.
pub const DEFAULT_BACKOFF_UNIT_MS: u64 = 2_000;

/// Number of runs sampled by the median strategy.
pub const DEFAULT_MEDIAN_RUNS: usize = 3;

/// Interval at which a waiter re-checks the concurrency gate.
pub const GATE_POLL_INTERVAL_MS: u64 = 1_000;

/// Upper bound on a single engine attempt (3 minutes).
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 180_000;

/// Default listen address of the HTTP server.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Tunables for the orchestration core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Validity window of a cache entry, in milliseconds.
    pub cache_ttl_ms: u64,
    /// Maximum number of cached entries. `None` keeps the cache unbounded.
    pub cache_capacity: Option<usize>,
    /// Engine attempts per audit run.
    pub max_attempts: u32,
    /// Backoff unit in milliseconds.
    pub backoff_unit_ms: u64,
    /// Runs sampled per audit. `None` selects the single-run strategy.
    pub median_runs: Option<usize>,
    /// Deadline for one engine attempt. `None` or `0` waits indefinitely.
    pub attempt_timeout_ms: Option<u64>,
    /// Gate polling interval in milliseconds.
    pub gate_poll_interval_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            cache_capacity: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit_ms: DEFAULT_BACKOFF_UNIT_MS,
            median_runs: None,
            attempt_timeout_ms: Some(DEFAULT_ATTEMPT_TIMEOUT_MS),
            gate_poll_interval_ms: GATE_POLL_INTERVAL_MS,
        }
    }
}

impl OrchestratorConfig {
    /// Reject settings the orchestrator cannot operate with.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.max_attempts == 0 {
            return Err(AuditError::Config("max_attempts must be > 0".into()));
        }
        if self.median_runs == Some(0) {
            return Err(AuditError::Config("median_runs must be > 0".into()));
        }
        if self.gate_poll_interval_ms == 0 {
            return Err(AuditError::Config(
                "gate_poll_interval_ms must be > 0".into(),
            ));
        }
        if self.cache_capacity == Some(0) {
            return Err(AuditError::Config("cache_capacity must be > 0".into()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn gate_poll_interval(&self) -> Duration {
        Duration::from_millis(self.gate_poll_interval_ms)
    }
}

/// Settings for the Lighthouse-compatible engine adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable invoked once per attempt.
    pub binary: String,
    /// Arguments placed before the audit arguments, e.g. `["lighthouse"]`
    /// when `binary` is `npx`.
    pub base_args: Vec<String>,
    /// Flags forwarded to the headless browser.
    pub chrome_flags: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "lighthouse".to_string(),
            base_args: Vec::new(),
            chrome_flags: "--headless=new --no-sandbox --disable-gpu".to_string(),
        }
    }
}
