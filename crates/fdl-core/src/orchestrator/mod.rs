//! Batch orchestrator: owns configuration and lifecycle, drives probing,
//! admission-controlled dispatch and progress aggregation.
//!
//! An [`Orchestrator`] runs exactly one batch: `Ready → Running → Terminal`.
//! Its methods take `&self`, so it can be shared (e.g. in an `Arc`) between
//! the task running the batch and whoever cancels it or reads progress.

mod execute;
mod lifecycle;
mod report;

pub use report::{BatchReport, TransferOutcome};

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::FdlConfig;
use crate::error::FdlError;
use crate::logging::{self, LogSink};
use crate::probe::{HttpProber, SizeProber};
use crate::progress::{telemetry_channels, ProgressSenders, ProgressStreams};
use crate::request::DownloadRequest;
use crate::scope::{CancelHandle, ExecutionScope, TimeoutGuard};
use crate::transfer::{HttpTransfer, TransferWorker};

use self::lifecycle::RunGuard;

/// Lifecycle of an orchestrator. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Ready,
    Running,
    Terminal,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchState::Ready => "ready",
            BatchState::Running => "running",
            BatchState::Terminal => "terminal",
        };
        f.write_str(s)
    }
}

#[derive(Default)]
struct Inner {
    state: BatchState,
    total_expected_bytes: u64,
    cancel: Option<CancelHandle>,
    senders: Option<ProgressSenders>,
    streams: Option<ProgressStreams>,
    report: Option<BatchReport>,
}

pub struct Orchestrator {
    config: FdlConfig,
    timeout: Duration,
    log: Arc<dyn LogSink>,
    prober: Arc<dyn SizeProber>,
    worker: Arc<dyn TransferWorker>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Builder for an [`Orchestrator`] with custom collaborators or log sink.
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: Option<FdlConfig>,
    timeout: Option<Duration>,
    log: Option<Arc<dyn LogSink>>,
    prober: Option<Arc<dyn SizeProber>>,
    worker: Option<Arc<dyn TransferWorker>>,
}

impl OrchestratorBuilder {
    pub fn config(mut self, config: FdlConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Batch timeout with sub-minute precision, replacing `timeout_minutes`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn prober(mut self, prober: Arc<dyn SizeProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn transfer(mut self, worker: Arc<dyn TransferWorker>) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Validates the configuration and fills in defaults: built-in config,
    /// `tracing` log sink, HTTP prober and transfer.
    pub fn build(self) -> Result<Orchestrator, FdlError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let timeout = match self.timeout {
            Some(t) if t.is_zero() => {
                return Err(FdlError::Configuration(
                    "timeout must be greater than zero".to_string(),
                ))
            }
            Some(t) => t,
            None => config.timeout(),
        };
        if config.max_retry > 0 {
            tracing::warn!(
                max_retry = config.max_retry,
                "max_retry is set but retries are not performed; failed transfers are reported once"
            );
        }

        let mut inner = Inner::default();
        if config.detailed_progress {
            let (senders, streams) = telemetry_channels();
            inner.senders = Some(senders);
            inner.streams = Some(streams);
        }

        Ok(Orchestrator {
            log: self.log.unwrap_or_else(logging::default_sink),
            prober: self.prober.unwrap_or_else(|| Arc::new(HttpProber::new())),
            worker: self.worker.unwrap_or_else(|| Arc::new(HttpTransfer::new())),
            config,
            timeout,
            inner: Mutex::new(inner),
        })
    }
}

/// Everything one run holds until it returns.
struct Run<'a> {
    _guard: RunGuard<'a>,
    _timeout: TimeoutGuard,
    scope: ExecutionScope,
    senders: Option<ProgressSenders>,
}

impl Orchestrator {
    /// Orchestrator with HTTP collaborators. `None` selects the default config.
    pub fn new(config: Option<FdlConfig>) -> Result<Self, FdlError> {
        let builder = Self::builder();
        match config {
            Some(cfg) => builder.config(cfg).build(),
            None => builder.build(),
        }
    }

    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub fn config(&self) -> &FdlConfig {
        &self.config
    }

    pub fn state(&self) -> BatchState {
        self.lock().state
    }

    /// Sum of all probed sizes; 0 until probing has finished.
    pub fn total_expected_bytes(&self) -> u64 {
        self.lock().total_expected_bytes
    }

    /// Cancel trigger for the running batch; `None` outside `Running`.
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.lock().cancel.clone()
    }

    /// Cancels the running batch. Returns false if there is nothing to cancel.
    pub fn cancel(&self) -> bool {
        match self.cancel_handle() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Hands out the telemetry receivers, once. `None` when detailed progress
    /// is disabled or the streams were already taken.
    pub fn take_progress(&self) -> Option<ProgressStreams> {
        self.lock().streams.take()
    }

    /// Per-request outcomes; available once the transfers of a batch have been joined.
    pub fn report(&self) -> Option<BatchReport> {
        self.lock().report.clone()
    }

    /// Downloads one resource.
    pub async fn run_single(
        &self,
        url: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Result<(), FdlError> {
        self.run_batch(vec![DownloadRequest::new(url, local_path)])
            .await
    }

    /// Downloads every request with at most `max_concurrent_transfers` in flight.
    /// Fails with `InvalidState` unless this orchestrator is still `Ready`.
    pub async fn run_batch(&self, requests: Vec<DownloadRequest>) -> Result<(), FdlError> {
        let run = self.begin()?;
        self.execute(requests, run.scope, run.senders).await
    }

    /// Leaves `Ready`. The scope and its cancel handle are published under the
    /// same lock as the state change, so a caller that observes `Running` can
    /// always cancel.
    fn begin(&self) -> Result<Run<'_>, FdlError> {
        let mut inner = self.lock();
        if inner.state != BatchState::Ready {
            return Err(FdlError::InvalidState(inner.state));
        }
        // The timeout covers probing too; the timer stops when the run ends.
        let (scope, timeout) = ExecutionScope::with_timeout(self.timeout);
        inner.state = BatchState::Running;
        inner.cancel = Some(scope.cancel_handle());
        let senders = inner.senders.take();
        drop(inner);
        Ok(Run {
            _guard: RunGuard { orchestrator: self },
            _timeout: timeout,
            scope,
            senders,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
