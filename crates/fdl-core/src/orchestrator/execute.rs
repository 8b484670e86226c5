//! The batch algorithm: probe everything, then dispatch through the admission
//! controller while the aggregator tallies progress.

use std::sync::Arc;

use crate::admission::AdmissionController;
use crate::error::FdlError;
use crate::progress::{ProgressAggregator, ProgressSenders};
use crate::request::{DownloadRequest, ResumeInfo};
use crate::scope::ExecutionScope;
use crate::transfer::ByteSink;

use super::report::{BatchReport, TransferOutcome};
use super::Orchestrator;

type TaskOutput = (usize, u64, Result<(), String>);

impl Orchestrator {
    pub(super) async fn execute(
        &self,
        requests: Vec<DownloadRequest>,
        scope: ExecutionScope,
        senders: Option<ProgressSenders>,
    ) -> Result<(), FdlError> {
        self.log.log(&format!("download files: {}", requests.len()));

        let infos = self.probe_all(&requests, &scope).await?;
        let total: u64 = infos
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.content_length));
        self.lock().total_expected_bytes = total;
        self.log.log(&format!("total download bytes: {}", total));

        let (sink, deltas) = ByteSink::channel();
        let aggregator = ProgressAggregator::new(total, senders, Arc::clone(&self.log))
            .spawn(deltas, scope.clone());

        let mut admission = AdmissionController::<TaskOutput>::new(self.config.max_concurrent_transfers);
        let mut dispatched = vec![false; requests.len()];
        for (index, (request, info)) in requests.iter().zip(infos.iter().copied()).enumerate() {
            if scope.is_cancelled() {
                self.log.log("batch ended before all transfers were started");
                break;
            }
            let worker = Arc::clone(&self.worker);
            let task_scope = scope.clone();
            let task_sink = sink.for_transfer();
            let task_request = request.clone();
            let submitted = admission
                .submit(async move {
                    let counter = task_sink.clone();
                    let res = tokio::task::spawn_blocking(move || {
                        worker.transfer(&task_scope, &task_request, info, &task_sink)
                    })
                    .await;
                    let result = match res {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(format!("{:#}", e)),
                        Err(e) => Err(format!("transfer worker panicked: {}", e)),
                    };
                    (index, counter.reported(), result)
                })
                .await;
            if let Err(e) = submitted {
                scope.cancel();
                return Err(e);
            }
            dispatched[index] = true;
            tracing::debug!(url = %request.url, in_flight = admission.in_flight(), "transfer admitted");
        }

        self.log.log("waiting for all transfers to finish");
        // Last producer handle held here: once tasks are joined, the aggregator sees the channel close.
        drop(sink);
        let joined = admission.join_all().await;
        tracing::debug!(
            peak_in_flight = admission.peak_in_flight(),
            limit = admission.limit(),
            "all transfer tasks joined"
        );

        let mut outcomes: Vec<Option<TransferOutcome>> = vec![None; requests.len()];
        for res in joined {
            match res {
                Ok((index, bytes, result)) => {
                    if let Err(ref e) = result {
                        tracing::warn!(url = %requests[index].url, error = %e, "transfer failed");
                    }
                    outcomes[index] = Some(TransferOutcome {
                        request: requests[index].clone(),
                        bytes,
                        result,
                    });
                }
                Err(e) => tracing::warn!(error = %e, "transfer task lost"),
            }
        }
        let outcomes: Vec<TransferOutcome> = outcomes
            .into_iter()
            .enumerate()
            .map(|(index, o)| {
                o.unwrap_or_else(|| TransferOutcome {
                    request: requests[index].clone(),
                    bytes: 0,
                    result: Err(if dispatched[index] {
                        "transfer task aborted".to_string()
                    } else {
                        "not started: batch ended".to_string()
                    }),
                })
            })
            .collect();

        let summary = aggregator
            .await
            .map_err(|e| FdlError::Join(format!("progress aggregator: {}", e)))?;

        let scope_error = scope.err();
        let report = BatchReport {
            outcomes,
            expected_bytes: total,
            transferred_bytes: summary.transferred_bytes,
            scope_error,
        };
        let failed = report.failed_count();
        let count = report.outcomes.len();
        self.log.log(&format!(
            "all download tasks done: {} ok, {} failed, {} / {} bytes",
            report.succeeded(),
            failed,
            summary.transferred_bytes,
            total
        ));
        self.lock().report = Some(report);

        if let Some(e) = scope_error {
            return Err(e.into());
        }
        if self.config.fail_on_transfer_error && failed > 0 {
            return Err(FdlError::TransferFailed {
                failed,
                total: count,
            });
        }
        Ok(())
    }

    /// Probes every request in order. Any failure aborts before a single transfer starts.
    async fn probe_all(
        &self,
        requests: &[DownloadRequest],
        scope: &ExecutionScope,
    ) -> Result<Vec<ResumeInfo>, FdlError> {
        let mut infos = Vec::with_capacity(requests.len());
        for request in requests {
            if let Some(e) = scope.err() {
                return Err(e.into());
            }
            let prober = Arc::clone(&self.prober);
            let url = request.url.clone();
            let probed = tokio::task::spawn_blocking(move || prober.probe(&url))
                .await
                .map_err(|e| FdlError::Join(format!("size probe: {}", e)))?;
            let info = probed.map_err(|source| {
                self.log
                    .log(&format!("could not get size of {}: {}", request.url, source));
                FdlError::Probe {
                    url: request.url.clone(),
                    source,
                }
            })?;
            tracing::debug!(
                url = %request.url,
                size = info.content_length,
                resumable = info.resumable,
                "size probed"
            );
            infos.push(info);
        }
        Ok(infos)
    }
}
