pub mod config;
pub mod error;
pub mod logging;

pub mod admission;
pub mod orchestrator;
pub mod probe;
pub mod progress;
pub mod request;
pub mod scope;
pub mod transfer;

pub use config::FdlConfig;
pub use error::{FdlError, ProbeError, ScopeError};
pub use orchestrator::{BatchReport, BatchState, Orchestrator, OrchestratorBuilder, TransferOutcome};
pub use progress::{ProgressStreams, ProgressSummary};
pub use request::{DownloadRequest, ResumeInfo};
pub use scope::{CancelHandle, ExecutionScope};
