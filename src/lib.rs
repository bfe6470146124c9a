//! Page audit orchestration.
//!
//! Serializes runs of an external page-quality engine behind a single
//! process-wide gate, caches results per (url, device) for a fixed TTL,
//! retries failed runs with linear backoff and can sample several runs to
//! pick a representative one.

pub mod api;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod source;

pub use audit::{AuditRequest, AuditResult, DeviceProfile, MetricSet};
pub use engine::orchestrator::Orchestrator;
pub use error::{AuditError, EngineError, ValidationError};
