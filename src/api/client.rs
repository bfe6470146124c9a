// HTTP client for the audit endpoint, following the mobile-then-desktop call sequence.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::audit::{AuditResult, DeviceProfile};
use crate::engine::cancel::CancelHandle;
use crate::server::handler::ErrorBody;

/// Cosmetic progress stages. They do not track real engine progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Starting,
    Analyzing,
    Complete,
}

impl ProgressStage {
    pub fn percent(&self) -> u8 {
        match self {
            ProgressStage::Starting => 0,
            ProgressStage::Analyzing => 50,
            ProgressStage::Complete => 100,
        }
    }
}

/// Results for both device profiles of one url.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub mobile: AuditResult,
    pub desktop: AuditResult,
}

#[derive(Serialize)]
struct AuditPayload<'a> {
    url: &'a str,
    device: &'a str,
}

pub struct AuditClient {
    http: Client,
    base_url: String,
    cancel: CancelHandle,
}

impl AuditClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cancel: CancelHandle::new(),
        }
    }

    /// One audit call. Server-side errors surface as `"<error>: <message>"`.
    pub async fn audit(&self, url: &str, device: DeviceProfile) -> Result<AuditResult> {
        let endpoint = format!("{}/api/audit", self.base_url);
        debug!("POST {} url={} device={}", endpoint, url, device);

        let resp = self
            .http
            .post(&endpoint)
            .json(&AuditPayload {
                url,
                device: device.as_str(),
            })
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<AuditResult>().await?);
        }

        match resp.json::<ErrorBody>().await {
            Ok(body) => Err(anyhow!("{}: {}", body.error, body.message)),
            Err(_) => Err(anyhow!("audit request failed: HTTP {}", status.as_u16())),
        }
    }

    /// Audit `url` for mobile, then desktop, as two independent calls.
    ///
    /// Starting a new run calls the cancel hook, which does not stop an audit
    /// that is already running on the server.
    pub async fn audit_all<F>(&self, url: &str, mut on_progress: F) -> Result<DeviceReport>
    where
        F: FnMut(ProgressStage),
    {
        self.cancel.cancel();
        on_progress(ProgressStage::Starting);
        on_progress(ProgressStage::Analyzing);

        let mobile = self.audit(url, DeviceProfile::Mobile).await?;
        let desktop = self.audit(url, DeviceProfile::Desktop).await?;

        on_progress(ProgressStage::Complete);
        info!(
            "audit complete url={} mobile={} desktop={}",
            url, mobile.performance, desktop.performance
        );
        Ok(DeviceReport { mobile, desktop })
    }
}
