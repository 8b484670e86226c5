//! Aggregator task: tally byte deltas, sample once per tick, stop on scope end or completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::{fraction, ProgressSenders, ProgressSummary, TICK_INTERVAL};
use crate::logging::LogSink;
use crate::scope::ExecutionScope;

pub(crate) struct ProgressAggregator {
    expected: u64,
    interval: Duration,
    senders: Option<ProgressSenders>,
    log: Arc<dyn LogSink>,
}

impl ProgressAggregator {
    pub(crate) fn new(
        expected: u64,
        senders: Option<ProgressSenders>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            expected,
            interval: TICK_INTERVAL,
            senders,
            log,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub(crate) fn spawn(
        self,
        deltas: mpsc::UnboundedReceiver<u64>,
        scope: ExecutionScope,
    ) -> tokio::task::JoinHandle<ProgressSummary> {
        tokio::spawn(self.run(deltas, scope))
    }

    /// Publishes samples until the scope ends or every byte producer has dropped
    /// its sink. Either way the telemetry senders are dropped right then, closing
    /// both streams. After a scope end the task keeps tallying silently until
    /// the last sink is gone, so the summary counts every reported byte.
    pub(crate) async fn run(
        mut self,
        mut deltas: mpsc::UnboundedReceiver<u64>,
        scope: ExecutionScope,
    ) -> ProgressSummary {
        self.log.log(&format!("total bytes to transfer: {}", self.expected));
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut total = 0u64;
        let mut last_sample = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = scope.cancelled() => {
                    self.senders = None;
                    self.log.log("progress aggregator stopped: batch scope ended");
                    while let Some(n) = deltas.recv().await {
                        total = total.saturating_add(n);
                    }
                    break;
                }
                _ = ticker.tick() => self.sample(total, &mut last_sample),
                delta = deltas.recv() => match delta {
                    Some(n) => total = total.saturating_add(n),
                    None => {
                        // Every producer is gone: publish the tail of the last interval.
                        self.sample(total, &mut last_sample);
                        self.log.log("progress aggregator finished: all transfers done");
                        break;
                    }
                },
            }
        }

        ProgressSummary {
            transferred_bytes: total,
            expected_bytes: self.expected,
        }
    }

    fn sample(&self, total: u64, last_sample: &mut u64) {
        let delta = total - *last_sample;
        *last_sample = total;
        self.log.log(&format!(
            "transferred {} bytes since last sample, {} / {}",
            delta, total, self.expected
        ));
        let Some(senders) = &self.senders else {
            return;
        };
        if senders.throughput.try_send(delta).is_err() {
            tracing::debug!(delta, "throughput sample dropped (subscriber behind or gone)");
        }
        if let Some(p) = fraction(total, self.expected) {
            if senders.fraction.try_send(p).is_err() {
                tracing::debug!(progress = p, "progress sample dropped (subscriber behind or gone)");
            }
        }
    }
}
