//! RAII guard that moves the orchestrator to `Terminal` on every exit path.

use super::{BatchState, Orchestrator};

/// Created when a run leaves `Ready`. Dropping it (normal return, `?`, panic,
/// or the run future being dropped) clears the cancel handle and sets `Terminal`.
pub(super) struct RunGuard<'a> {
    pub(super) orchestrator: &'a Orchestrator,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.orchestrator.lock();
        inner.cancel = None;
        inner.state = BatchState::Terminal;
    }
}
