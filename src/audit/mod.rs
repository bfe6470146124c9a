// Audit data model: device presets, validated requests and converted results.

pub mod device;
pub mod request;
pub mod result;

pub use device::{DeviceProfile, Throttling};
pub use request::AuditRequest;
pub use result::{AuditResult, MetricSet, RawAudit, RawMetrics, RawScores};
