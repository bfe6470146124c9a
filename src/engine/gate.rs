// Process-wide single-slot gate — at most one engine invocation at any instant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error};

use crate::config::GATE_POLL_INTERVAL_MS;
use crate::error::AuditError;

/// A single slot shared by every audit in the process.
///
/// Waiters poll the slot at a fixed interval rather than queueing, so there
/// is no ordering among them and a waiter can be starved under sustained
/// load. The gate is global and is not keyed by url or device.
#[derive(Debug)]
pub struct ConcurrencyGate {
    held: AtomicBool,
    poll_interval: Duration,
}

impl ConcurrencyGate {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            held: AtomicBool::new(false),
            poll_interval,
        }
    }

    /// Take the slot if it is free.
    pub fn try_acquire(&self) -> Option<GateGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GateGuard { gate: self })
    }

    /// Wait for the slot, re-checking every poll interval.
    pub async fn acquire(&self) -> GateGuard<'_> {
        let mut polls = 0u64;
        loop {
            if let Some(guard) = self.try_acquire() {
                if polls > 0 {
                    debug!("gate acquired after {} polls", polls);
                }
                return guard;
            }
            if polls == 0 {
                debug!("gate busy, polling every {:?}", self.poll_interval);
            }
            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Free the slot. Releasing a free slot is a defect.
    pub fn release(&self) -> Result<(), AuditError> {
        if self.held.swap(false, Ordering::AcqRel) {
            Ok(())
        } else {
            Err(AuditError::Orchestration(
                "concurrency gate released while not held".to_string(),
            ))
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(GATE_POLL_INTERVAL_MS))
    }
}

/// Holds the gate slot; releases it when dropped.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    gate: &'a ConcurrencyGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.gate.release() {
            error!("{}", e);
        }
    }
}
