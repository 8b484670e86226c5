//! Admission control for transfer tasks.
//!
//! A counting semaphore with `limit` permits gates task start. `submit` waits
//! for a permit before spawning, so the submitting loop blocks once `limit`
//! tasks are running and resumes as soon as any of them finishes. The permit
//! is released by the task's [`guard::SlotGuard`], exactly once per task.

mod guard;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::error::FdlError;

use self::guard::SlotGuard;

#[derive(Debug, Default)]
struct SlotCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    submitted: AtomicUsize,
}

/// Bounds how many submitted tasks run at once and joins them all at the end.
pub struct AdmissionController<T> {
    limit: usize,
    permits: Arc<Semaphore>,
    counters: Arc<SlotCounters>,
    tasks: JoinSet<T>,
}

impl<T: Send + 'static> AdmissionController<T> {
    /// Create a controller admitting at most `limit` concurrent tasks (at least 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            permits: Arc::new(Semaphore::new(limit)),
            counters: Arc::new(SlotCounters::default()),
            tasks: JoinSet::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Tasks currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously admitted tasks seen so far.
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::Acquire)
    }

    pub fn submitted(&self) -> usize {
        self.counters.submitted.load(Ordering::Acquire)
    }

    /// Waits for a free slot, then starts `task` on the runtime.
    pub async fn submit<F>(&mut self, task: F) -> Result<(), FdlError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        if self.permits.available_permits() == 0 {
            tracing::debug!(limit = self.limit, "admission full, waiting for a running transfer");
        }
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| FdlError::Join(format!("admission gate closed: {}", e)))?;
        let guard = SlotGuard::enter(permit, Arc::clone(&self.counters));
        self.counters.submitted.fetch_add(1, Ordering::AcqRel);
        self.tasks.spawn(async move {
            let _guard = guard;
            task.await
        });
        Ok(())
    }

    /// Waits for every submitted task. A panicked task shows up as `Err`.
    pub async fn join_all(&mut self) -> Vec<Result<T, JoinError>> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(res) = self.tasks.join_next().await {
            results.push(res);
        }
        results
    }
}
