// Lighthouse CLI adapter — runs one headless audit per call and parses the JSON report.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::process::EngineProcess;
use super::traits::AuditEngine;
use crate::audit::{DeviceProfile, RawAudit, RawMetrics, RawScores};
use crate::config::EngineConfig;
use crate::error::EngineError;

const CATEGORIES: [&str; 4] = ["performance", "accessibility", "best-practices", "seo"];

#[derive(Debug, Deserialize)]
struct Report {
    #[serde(default)]
    categories: HashMap<String, ReportCategory>,
    #[serde(default)]
    audits: HashMap<String, ReportAudit>,
    #[serde(rename = "runtimeError")]
    runtime_error: Option<RuntimeError>,
}

#[derive(Debug, Deserialize)]
struct ReportCategory {
    score: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ReportAudit {
    #[serde(rename = "numericValue")]
    numeric_value: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RuntimeError {
    code: Option<String>,
    message: Option<String>,
}

pub struct LighthouseEngine {
    config: EngineConfig,
}

impl LighthouseEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Command-line arguments for one audit of `url` under `device`.
    pub fn command_args(&self, url: &str, device: DeviceProfile) -> Vec<String> {
        let t = device.throttling();
        let is_mobile = device == DeviceProfile::Mobile;
        vec![
            url.to_string(),
            "--output=json".to_string(),
            "--output-path=stdout".to_string(),
            "--quiet".to_string(),
            format!("--only-categories={}", CATEGORIES.join(",")),
            format!("--chrome-flags={}", self.config.chrome_flags),
            format!("--form-factor={}", device),
            format!("--screenEmulation.mobile={}", is_mobile),
            format!("--screenEmulation.width={}", t.viewport_width),
            format!("--screenEmulation.height={}", t.viewport_height),
            format!("--screenEmulation.deviceScaleFactor={}", t.device_scale_factor),
            "--throttling-method=simulate".to_string(),
            format!("--throttling.rttMs={}", t.latency_ms),
            format!("--throttling.throughputKbps={}", t.download_kbps),
            format!("--throttling.uploadThroughputKbps={}", t.upload_kbps),
            format!("--throttling.cpuSlowdownMultiplier={}", t.cpu_slowdown_multiplier),
        ]
    }
}

#[async_trait]
impl AuditEngine for LighthouseEngine {
    async fn run(&self, url: &str, device: DeviceProfile) -> Result<RawAudit, EngineError> {
        let mut command = Command::new(&self.config.binary);
        command
            .args(&self.config.base_args)
            .args(self.command_args(url, device));

        let mut process = EngineProcess::spawn(command)?;
        info!(
            "lighthouse started pid={:?} url={} device={}",
            process.pid(),
            url,
            device
        );

        let output = process.collect().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.trim().lines().last().unwrap_or("").to_string();
            warn!(
                "lighthouse exited with {} url={} device={}",
                output.status, url, device
            );
            return Err(EngineError::Navigation(format!(
                "lighthouse exited with {}: {}",
                output.status, tail
            )));
        }

        debug!("lighthouse report {} bytes", output.stdout.len());
        parse_report(&output.stdout)
    }

    fn name(&self) -> &str {
        "lighthouse"
    }
}

/// Extract scores and metrics from a Lighthouse JSON report.
pub fn parse_report(json: &[u8]) -> Result<RawAudit, EngineError> {
    let report: Report = serde_json::from_slice(json)?;

    if let Some(err) = report.runtime_error {
        return Err(EngineError::Navigation(format!(
            "{}: {}",
            err.code.unwrap_or_else(|| "RUNTIME_ERROR".to_string()),
            err.message.unwrap_or_default()
        )));
    }

    let score = |id: &str| -> Result<Option<f64>, EngineError> {
        report
            .categories
            .get(id)
            .map(|c| c.score.as_ref().and_then(serde_json::Value::as_f64))
            .ok_or_else(|| EngineError::MissingData(format!("category '{}'", id)))
    };
    let metric = |id: &str| -> Result<f64, EngineError> {
        report
            .audits
            .get(id)
            .map(|a| {
                a.numeric_value
                    .as_ref()
                    .and_then(serde_json::Value::as_f64)
                    .unwrap_or(f64::NAN)
            })
            .ok_or_else(|| EngineError::MissingData(format!("metric '{}'", id)))
    };

    Ok(RawAudit {
        scores: RawScores {
            performance: score("performance")?,
            accessibility: score("accessibility")?,
            best_practices: score("best-practices")?,
            seo: score("seo")?,
        },
        metrics: RawMetrics {
            first_contentful_paint_ms: metric("first-contentful-paint")?,
            largest_contentful_paint_ms: metric("largest-contentful-paint")?,
            total_blocking_time_ms: metric("total-blocking-time")?,
            cumulative_layout_shift: metric("cumulative-layout-shift")?,
            speed_index_ms: metric("speed-index")?,
        },
    })
}
