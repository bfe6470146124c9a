use tracing::debug;

/// Cancellation hook for audits.
///
/// Engine runs cannot be preempted: calling [`CancelHandle::cancel`] only
/// records the request, and any in-flight audit runs to completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelHandle;

impl CancelHandle {
    pub fn new() -> Self {
        Self
    }

    pub fn cancel(&self) {
        debug!("audit cancel requested; in-flight engine work is not interrupted");
    }
}
