use async_trait::async_trait;

use crate::audit::{DeviceProfile, RawAudit};
use crate::error::EngineError;

/// One invocation of the external page-quality engine.
///
/// Implementations must release any process they start before returning,
/// and also when the returned future is dropped early (deadline expiry).
#[async_trait]
pub trait AuditEngine: Send + Sync {
    async fn run(&self, url: &str, device: DeviceProfile) -> Result<RawAudit, EngineError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "engine"
    }
}
