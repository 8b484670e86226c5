#![allow(dead_code)]

pub mod mock;
pub mod range_server;

use std::sync::{Arc, Mutex};

use fdl_core::logging::{FnSink, LogSink};
use fdl_core::ProgressStreams;

/// Log sink that keeps every message for assertions.
pub fn collecting_sink() -> (Arc<dyn LogSink>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    let sink = FnSink(move |m: &str| seen_cb.lock().unwrap().push(m.to_string()));
    (Arc::new(sink), seen)
}

/// Drains both telemetry streams until they close; resolves with everything received.
pub fn drain(streams: ProgressStreams) -> tokio::task::JoinHandle<(Vec<f64>, Vec<u64>)> {
    let ProgressStreams {
        mut fraction,
        mut throughput,
    } = streams;
    tokio::spawn(async move {
        let fractions = async {
            let mut out = Vec::new();
            while let Some(p) = fraction.recv().await {
                out.push(p);
            }
            out
        };
        let rates = async {
            let mut out = Vec::new();
            while let Some(d) = throughput.recv().await {
                out.push(d);
            }
            out
        };
        tokio::join!(fractions, rates)
    })
}
