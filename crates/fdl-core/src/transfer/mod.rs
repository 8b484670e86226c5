//! Transfer workers: the code that actually moves bytes for one request.
//!
//! The orchestrator only depends on [`TransferWorker`] and hands every worker a
//! [`ByteSink`] clone. [`HttpTransfer`] is the default libcurl implementation.

mod http;

pub use http::HttpTransfer;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::request::{DownloadRequest, ResumeInfo};
use crate::scope::ExecutionScope;

/// Performs one transfer.
///
/// Blocking; runs on the blocking pool. Implementations push incremental byte
/// counts (never cumulative) to `sink` as data lands at the destination, check
/// `scope` regularly and return promptly once it is cancelled. Partially
/// written destinations are left in place.
pub trait TransferWorker: Send + Sync {
    fn transfer(
        &self,
        scope: &ExecutionScope,
        request: &DownloadRequest,
        resume: ResumeInfo,
        sink: &ByteSink,
    ) -> anyhow::Result<()>;
}

/// Producer side of the shared byte-count channel. Cheap to clone; the
/// aggregator sees the channel close once every clone is dropped.
#[derive(Debug, Clone)]
pub struct ByteSink {
    tx: mpsc::UnboundedSender<u64>,
    reported: Arc<AtomicU64>,
}

impl ByteSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                reported: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// A sink feeding the same channel with its own `reported` counter, one per transfer.
    pub fn for_transfer(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            reported: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Reports `bytes` newly written. Zero-byte reports are skipped.
    pub fn add(&self, bytes: u64) {
        if bytes == 0 {
            return;
        }
        self.reported.fetch_add(bytes, Ordering::Relaxed);
        // Receiver gone means the aggregator stopped after cancellation.
        let _ = self.tx.send(bytes);
    }

    /// Bytes reported through this sink (and its clones, not `for_transfer` children).
    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}
