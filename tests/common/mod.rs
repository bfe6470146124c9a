// Scripted in-process engine shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use pagecheck_engine::audit::{DeviceProfile, RawAudit, RawMetrics, RawScores};
use pagecheck_engine::error::EngineError;
use pagecheck_engine::source::traits::AuditEngine;

#[derive(Debug, Clone)]
pub enum Step {
    /// Succeed with this performance fraction.
    Score(f64),
    /// Succeed with a report that has no performance score.
    NoPerformance,
    /// Fail with a navigation error.
    Fail(&'static str),
    /// Never finish.
    Hang,
}

pub fn raw_audit(performance: Option<f64>) -> RawAudit {
    RawAudit {
        scores: RawScores {
            performance,
            accessibility: Some(0.9),
            best_practices: Some(0.95),
            seo: Some(1.0),
        },
        metrics: RawMetrics {
            first_contentful_paint_ms: 1500.0,
            largest_contentful_paint_ms: 2500.0,
            total_blocking_time_ms: 123.7,
            cumulative_layout_shift: 0.02,
            speed_index_ms: 3000.0,
        },
    }
}

pub struct ScriptedEngine {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    delay: Duration,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
    call_urls: Mutex<Vec<(String, DeviceProfile)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedEngine {
    /// Plays `script` in order, then repeats `fallback` forever.
    pub fn new(script: Vec<Step>, fallback: Step) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
            call_urls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn always(step: Step) -> Self {
        Self::new(Vec::new(), step)
    }

    /// Each run takes `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().clone()
    }

    pub fn call_urls(&self) -> Vec<(String, DeviceProfile)> {
        self.call_urls.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditEngine for ScriptedEngine {
    async fn run(&self, url: &str, device: DeviceProfile) -> Result<RawAudit, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().push(Instant::now());
        self.call_urls.lock().push((url.to_string(), device));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let step = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match step {
            Step::Score(p) => Ok(raw_audit(Some(p))),
            Step::NoPerformance => Ok(raw_audit(None)),
            Step::Fail(msg) => Err(EngineError::Navigation(msg.to_string())),
            Step::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
