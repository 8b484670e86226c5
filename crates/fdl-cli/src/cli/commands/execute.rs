//! Shared runner: builds the orchestrator, wires Ctrl-C to its cancel handle,
//! prints telemetry and the per-file summary.

use anyhow::{Context, Result};
use fdl_core::{BatchReport, DownloadRequest, FdlConfig, Orchestrator, ProgressStreams};
use std::sync::Arc;

pub async fn execute_requests(cfg: FdlConfig, requests: Vec<DownloadRequest>) -> Result<()> {
    let orch = Arc::new(Orchestrator::new(Some(cfg)).context("invalid configuration")?);
    let printer = orch.take_progress().map(|streams| tokio::spawn(print_progress(streams)));

    let ctrl_c = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() && orch.cancel() {
                eprintln!("\ninterrupted, cancelling transfers...");
            }
        })
    };

    let result = orch.run_batch(requests).await;
    ctrl_c.abort();
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    if let Some(report) = orch.report() {
        print_summary(&report);
    }
    result.map_err(anyhow::Error::from)
}

async fn print_progress(streams: ProgressStreams) {
    let ProgressStreams {
        mut fraction,
        mut throughput,
    } = streams;
    let mut last_pct: Option<f64> = None;
    loop {
        tokio::select! {
            p = fraction.recv() => match p {
                Some(p) => last_pct = Some(p * 100.0),
                None => break,
            },
            bytes = throughput.recv() => match bytes {
                Some(bytes) => {
                    let rate_mib = bytes as f64 / 1_048_576.0;
                    match last_pct {
                        Some(pct) => println!("  {:.1}%  {:.2} MiB/s", pct, rate_mib),
                        None => println!("  {:.2} MiB/s", rate_mib),
                    }
                }
                None => break,
            },
        }
    }
    // Both streams close together; drain whatever the other one still holds.
    while fraction.recv().await.is_some() {}
    while throughput.recv().await.is_some() {}
}

fn print_summary(report: &BatchReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => println!(
                "  ok      {} ({} bytes)",
                outcome.request.local_path.display(),
                outcome.bytes
            ),
            Err(e) => println!("  FAILED  {}: {}", outcome.request.local_path.display(), e),
        }
    }
    let total_mib = report.transferred_bytes as f64 / 1_048_576.0;
    println!(
        "{} ok, {} failed, {:.2} MiB transferred",
        report.succeeded(),
        report.failed_count(),
        total_mib
    );
}
