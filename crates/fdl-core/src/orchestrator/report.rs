//! Per-request outcomes of a finished batch.

use crate::error::ScopeError;
use crate::request::DownloadRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub request: DownloadRequest,
    /// Bytes the worker reported for this request (including resumed bytes).
    pub bytes: u64,
    /// `Err` carries the worker's error chain, or why the task never ran.
    pub result: Result<(), String>,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything known about a batch once it reached `Terminal`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One entry per request, in request order.
    pub outcomes: Vec<TransferOutcome>,
    pub expected_bytes: u64,
    /// Total seen by the progress aggregator before it stopped.
    pub transferred_bytes: u64,
    /// Set when the batch was cancelled or timed out.
    pub scope_error: Option<ScopeError>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(url: &str, result: Result<(), String>) -> TransferOutcome {
        TransferOutcome {
            request: DownloadRequest::new(url, "/tmp/x"),
            bytes: 0,
            result,
        }
    }

    #[test]
    fn counts_success_and_failure() {
        let report = BatchReport {
            outcomes: vec![
                outcome("a", Ok(())),
                outcome("b", Err("HTTP 500".to_string())),
                outcome("c", Ok(())),
            ],
            ..BatchReport::default()
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failed().next().unwrap().request.url, "b");
    }
}
