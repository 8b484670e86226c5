//! Instrumented in-memory collaborators for orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use fdl_core::probe::SizeProber;
use fdl_core::transfer::{ByteSink, TransferWorker};
use fdl_core::{DownloadRequest, ExecutionScope, ProbeError, ResumeInfo};

/// Prober answering from a fixed table; unknown URLs fail with `UnknownSize`.
#[derive(Default)]
pub struct MockProber {
    answers: HashMap<String, Result<ResumeInfo, ProbeError>>,
    calls: AtomicUsize,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, url: &str, size: u64) -> Self {
        self.answers.insert(
            url.to_string(),
            Ok(ResumeInfo {
                resumable: true,
                content_length: size,
            }),
        );
        self
    }

    pub fn failing(mut self, url: &str, err: ProbeError) -> Self {
        self.answers.insert(url.to_string(), Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SizeProber for MockProber {
    fn probe(&self, url: &str) -> Result<ResumeInfo, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(url)
            .cloned()
            .unwrap_or(Err(ProbeError::UnknownSize))
    }
}

/// Transfer that "downloads" `content_length` bytes in chunks, tracking how
/// many transfers run at once.
pub struct MockTransfer {
    chunk: u64,
    chunk_delay: Duration,
    hold_until_cancelled: bool,
    failing: HashSet<String>,
    started: AtomicUsize,
    running: AtomicUsize,
    peak: AtomicUsize,
    finished: Mutex<Vec<String>>,
}

impl Default for MockTransfer {
    fn default() -> Self {
        Self {
            chunk: 50,
            chunk_delay: Duration::from_millis(5),
            hold_until_cancelled: false,
            failing: HashSet::new(),
            started: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: Mutex::new(Vec::new()),
        }
    }
}

impl MockTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Report a first chunk, then wait for the scope to end instead of finishing.
    pub fn hold_until_cancelled(mut self) -> Self {
        self.hold_until_cancelled = true;
        self
    }

    pub fn fail(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    fn body(&self, scope: &ExecutionScope, request: &DownloadRequest, resume: ResumeInfo, sink: &ByteSink) -> anyhow::Result<()> {
        if self.hold_until_cancelled {
            sink.add(self.chunk.min(resume.content_length));
            while !scope.is_cancelled() {
                std::thread::sleep(Duration::from_millis(2));
            }
            return Err(anyhow::Error::new(scope.err().unwrap()));
        }
        let mut remaining = resume.content_length;
        while remaining > 0 {
            if let Some(reason) = scope.err() {
                return Err(anyhow::Error::new(reason));
            }
            if self.failing.contains(&request.url) && remaining < resume.content_length {
                anyhow::bail!("connection reset while fetching {}", request.url);
            }
            let n = self.chunk.min(remaining);
            std::thread::sleep(self.chunk_delay);
            sink.add(n);
            remaining -= n;
        }
        if self.failing.contains(&request.url) {
            anyhow::bail!("connection reset while fetching {}", request.url);
        }
        Ok(())
    }
}

impl TransferWorker for MockTransfer {
    fn transfer(
        &self,
        scope: &ExecutionScope,
        request: &DownloadRequest,
        resume: ResumeInfo,
        sink: &ByteSink,
    ) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let result = self.body(scope, request, resume, sink);
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().unwrap().push(request.url.clone());
        result
    }
}
