//! Progress aggregation across all transfers of a batch.
//!
//! Every transfer pushes byte deltas into one channel; a single aggregator
//! task owns the running total and, once per tick, publishes throughput
//! (bytes since the previous tick) and fractional completion to subscribers.

mod worker;

pub(crate) use worker::ProgressAggregator;

use std::time::Duration;

use tokio::sync::mpsc;

/// Buffer size of each telemetry channel. Samples that do not fit are dropped.
pub const TELEMETRY_CAPACITY: usize = 10;

/// Interval between throughput samples.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Subscriber side of the telemetry channels. Both end (`recv` returns
/// `None`) exactly once, when the aggregator stops.
#[derive(Debug)]
pub struct ProgressStreams {
    /// Transferred / expected bytes, in `[0.0, 1.0]`. Silent when nothing is expected.
    pub fraction: mpsc::Receiver<f64>,
    /// Bytes transferred since the previous sample.
    pub throughput: mpsc::Receiver<u64>,
}

#[derive(Debug)]
pub(crate) struct ProgressSenders {
    pub(crate) fraction: mpsc::Sender<f64>,
    pub(crate) throughput: mpsc::Sender<u64>,
}

pub(crate) fn telemetry_channels() -> (ProgressSenders, ProgressStreams) {
    let (fraction_tx, fraction_rx) = mpsc::channel(TELEMETRY_CAPACITY);
    let (throughput_tx, throughput_rx) = mpsc::channel(TELEMETRY_CAPACITY);
    (
        ProgressSenders {
            fraction: fraction_tx,
            throughput: throughput_tx,
        },
        ProgressStreams {
            fraction: fraction_rx,
            throughput: throughput_rx,
        },
    )
}

/// Totals observed by the aggregator when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSummary {
    pub transferred_bytes: u64,
    pub expected_bytes: u64,
}

impl ProgressSummary {
    pub fn fraction(&self) -> Option<f64> {
        fraction(self.transferred_bytes, self.expected_bytes)
    }
}

/// `done / expected` clamped to 1.0; `None` when nothing is expected.
pub fn fraction(done: u64, expected: u64) -> Option<f64> {
    if expected == 0 {
        return None;
    }
    Some((done as f64 / expected as f64).min(1.0))
}
