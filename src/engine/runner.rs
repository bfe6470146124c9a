use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::gate::ConcurrencyGate;
use crate::audit::{AuditResult, DeviceProfile};
use crate::error::AuditError;

/// Something that produces one converted audit result per call.
#[async_trait]
pub trait AuditRunner: Send + Sync {
    async fn run(&self, url: &str, device: DeviceProfile) -> Result<AuditResult, AuditError>;
}

/// Runs the inner runner while holding the concurrency gate.
pub struct GatedRunner {
    inner: Arc<dyn AuditRunner>,
    gate: Arc<ConcurrencyGate>,
}

impl GatedRunner {
    pub fn new(inner: Arc<dyn AuditRunner>, gate: Arc<ConcurrencyGate>) -> Self {
        Self { inner, gate }
    }
}

#[async_trait]
impl AuditRunner for GatedRunner {
    async fn run(&self, url: &str, device: DeviceProfile) -> Result<AuditResult, AuditError> {
        let _guard = self.gate.acquire().await;
        debug!("gate held for url={} device={}", url, device);
        self.inner.run(url, device).await
    }
}
