//! Execution scope shared by every task of one batch: cooperative cancellation
//! plus a wall-clock timeout.
//!
//! Transfer workers check [`ExecutionScope::is_cancelled`] from their blocking
//! loops; async tasks await [`ExecutionScope::cancelled`]. The first reason to
//! end the scope (user cancel or timeout) is recorded and becomes the batch's
//! terminal error.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ScopeError;

#[derive(Debug, Clone, Default)]
pub struct ExecutionScope {
    token: CancellationToken,
    reason: Arc<OnceLock<ScopeError>>,
}

impl ExecutionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope that ends itself with [`ScopeError::TimedOut`] after `timeout`.
    /// Must be called inside a tokio runtime. Dropping the returned guard stops the timer.
    pub fn with_timeout(timeout: Duration) -> (Self, TimeoutGuard) {
        let scope = Self::new();
        let timer_scope = scope.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    tracing::warn!(?timeout, "batch timeout reached, cancelling transfers");
                    timer_scope.end(ScopeError::TimedOut);
                }
                _ = timer_scope.token.cancelled() => {}
            }
        });
        (scope, TimeoutGuard(handle))
    }

    /// Ends the scope. The first reason wins; later calls only re-signal.
    pub fn end(&self, reason: ScopeError) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn cancel(&self) {
        self.end(ScopeError::Cancelled);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope has ended.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// The reason the scope ended, or `None` while it is still live.
    pub fn err(&self) -> Option<ScopeError> {
        if !self.token.is_cancelled() {
            return None;
        }
        Some(self.reason.get().copied().unwrap_or(ScopeError::Cancelled))
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            scope: self.clone(),
        }
    }
}

/// Stops the timeout timer when dropped.
#[derive(Debug)]
pub struct TimeoutGuard(tokio::task::JoinHandle<()>);

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Caller-facing trigger for cancelling a running batch.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    scope: ExecutionScope,
}

impl CancelHandle {
    pub fn cancel(&self) {
        tracing::info!("batch cancellation requested");
        self.scope.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_scope_has_no_error() {
        let scope = ExecutionScope::new();
        assert!(!scope.is_cancelled());
        assert_eq!(scope.err(), None);
    }

    #[test]
    fn first_reason_wins() {
        let scope = ExecutionScope::new();
        scope.cancel_handle().cancel();
        scope.end(ScopeError::TimedOut);
        assert!(scope.is_cancelled());
        assert_eq!(scope.err(), Some(ScopeError::Cancelled));
    }

    #[tokio::test]
    async fn timeout_ends_scope() {
        let (scope, _guard) = ExecutionScope::with_timeout(Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(5), scope.cancelled())
            .await
            .expect("scope should time out");
        assert_eq!(scope.err(), Some(ScopeError::TimedOut));
    }

    #[tokio::test]
    async fn dropped_guard_disarms_timer() {
        let (scope, guard) = ExecutionScope::with_timeout(Duration::from_millis(20));
        drop(guard);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!scope.is_cancelled());
    }
}
