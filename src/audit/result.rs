// Engine output conversion — raw fractional scores and millisecond timings into
// the integer/second units returned to callers.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EngineError;

/// Category scores as reported by the engine, fractions in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawScores {
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
}

/// Timing metrics as reported by the engine, in milliseconds (CLS unitless).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetrics {
    pub first_contentful_paint_ms: f64,
    pub largest_contentful_paint_ms: f64,
    pub total_blocking_time_ms: f64,
    pub cumulative_layout_shift: f64,
    pub speed_index_ms: f64,
}

/// One engine run, before unit conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAudit {
    pub scores: RawScores,
    pub metrics: RawMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSet {
    /// Seconds.
    pub first_contentful_paint: f64,
    /// Seconds.
    pub largest_contentful_paint: f64,
    /// Milliseconds.
    pub total_blocking_time: u64,
    pub cumulative_layout_shift: f64,
    /// Seconds.
    pub speed_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub performance: u32,
    pub accessibility: u32,
    pub best_practices: u32,
    pub seo: u32,
    pub metrics: MetricSet,
}

impl AuditResult {
    /// Convert a raw engine run.
    ///
    /// A missing or non-finite performance score rejects the whole run so the
    /// caller can retry. Any other non-finite value is coerced to zero and
    /// logged.
    pub fn from_raw(raw: &RawAudit) -> Result<Self, EngineError> {
        let performance = match raw.scores.performance {
            Some(score) if score.is_finite() => to_percent(score),
            _ => return Err(EngineError::InvalidScore),
        };

        let m = &raw.metrics;
        let metrics = MetricSet {
            first_contentful_paint: finite_or_zero(
                "firstContentfulPaint",
                m.first_contentful_paint_ms / 1000.0,
            ),
            largest_contentful_paint: finite_or_zero(
                "largestContentfulPaint",
                m.largest_contentful_paint_ms / 1000.0,
            ),
            total_blocking_time: finite_or_zero(
                "totalBlockingTime",
                m.total_blocking_time_ms.round(),
            )
            .max(0.0) as u64,
            cumulative_layout_shift: finite_or_zero(
                "cumulativeLayoutShift",
                m.cumulative_layout_shift,
            ),
            speed_index: finite_or_zero("speedIndex", m.speed_index_ms / 1000.0),
        };

        Ok(Self {
            performance,
            accessibility: category_percent("accessibility", raw.scores.accessibility),
            best_practices: category_percent("bestPractices", raw.scores.best_practices),
            seo: category_percent("seo", raw.scores.seo),
            metrics,
        })
    }
}

fn to_percent(score: f64) -> u32 {
    (score * 100.0).round().clamp(0.0, 100.0) as u32
}

fn category_percent(name: &str, score: Option<f64>) -> u32 {
    match score {
        Some(s) if s.is_finite() => to_percent(s),
        other => {
            warn!("category {} has no numeric score ({:?}), using 0", name, other);
            0
        }
    }
}

fn finite_or_zero(name: &str, value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!("metric {} is not numeric ({}), using 0", name, value);
        0.0
    }
}
