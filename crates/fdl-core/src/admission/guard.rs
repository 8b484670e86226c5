//! RAII guard that gives an admission slot back when a task finishes.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;

use super::SlotCounters;

/// Holds one semaphore permit for the lifetime of a task. Dropping it (task
/// returned, panicked, or was aborted) releases exactly one slot.
pub(super) struct SlotGuard {
    _permit: OwnedSemaphorePermit,
    counters: Arc<SlotCounters>,
}

impl SlotGuard {
    pub(super) fn enter(permit: OwnedSemaphorePermit, counters: Arc<SlotCounters>) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        counters.peak.fetch_max(now, Ordering::AcqRel);
        Self {
            _permit: permit,
            counters,
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
