// Error types for validation, engine and orchestration failures.

use std::time::Duration;

use thiserror::Error;

use crate::audit::device::DeviceProfile;

/// Malformed caller input. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("url is required")]
    MissingUrl,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported url scheme '{0}', expected http or https")]
    UnsupportedScheme(String),

    #[error("device must be 'mobile' or 'desktop', got '{0}'")]
    InvalidDevice(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Failure of a single engine attempt. Always retryable.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine launch failed: {0}")]
    Launch(#[source] std::io::Error),

    #[error("engine run failed: {0}")]
    Navigation(String),

    #[error("engine attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("engine report missing {0}")]
    MissingData(String),

    #[error("engine report unreadable: {0}")]
    Report(#[from] serde_json::Error),

    #[error("engine returned no usable performance score")]
    InvalidScore,
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{device} audit failed after {attempts} attempts: {last_error}")]
    AuditFailed {
        device: DeviceProfile,
        attempts: u32,
        last_error: String,
    },

    #[error("orchestration invariant violated: {0}")]
    Orchestration(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AuditError {
    /// Stable machine-readable tag used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            AuditError::Validation(_) => "invalid_request",
            AuditError::AuditFailed { .. } => "audit_failed",
            AuditError::Orchestration(_) => "internal_error",
            AuditError::Config(_) => "invalid_configuration",
        }
    }
}
