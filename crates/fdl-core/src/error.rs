//! Error types returned at the library boundary.

use thiserror::Error;

use crate::orchestrator::BatchState;

/// Why the shared execution scope of a batch ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("batch cancelled")]
    Cancelled,
    #[error("batch timed out")]
    TimedOut,
}

/// Failure to determine a resource's size or resumability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Transport-level failure (DNS, connect, invalid URL, ...).
    #[error("probe request failed: {0}")]
    Request(String),
    /// Server answered with a non-2xx status.
    #[error("probe returned HTTP {0}")]
    Http(u32),
    /// No usable size was reported.
    #[error("resource size is unknown")]
    UnknownSize,
}

#[derive(Debug, Error)]
pub enum FdlError {
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A run was requested on an orchestrator that already left `Ready`.
    #[error("orchestrator is {0}, a batch can only be started once")]
    InvalidState(BatchState),

    #[error("could not probe {url}: {source}")]
    Probe {
        url: String,
        #[source]
        source: ProbeError,
    },

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("{failed} of {total} transfers failed")]
    TransferFailed { failed: usize, total: usize },

    /// A task or blocking worker could not be joined.
    #[error("task failure: {0}")]
    Join(String),
}

impl FdlError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FdlError::Scope(ScopeError::Cancelled))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, FdlError::Scope(ScopeError::TimedOut))
    }
}
