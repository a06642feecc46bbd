//! Detached background writes.
//!
//! Every persistence write leaves the caller's path through [`spawn_write`].
//! The caller gets a [`WriteHandle`] it may ignore; awaiting it only waits
//! for the write to settle and never yields an error.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::DIAGNOSTICS;

/// Handle to a fire-and-forget write.
///
/// Dropping the handle does not cancel the write.
#[derive(Debug)]
#[must_use = "dropping the handle is fine, but await `settled` in tests"]
pub struct WriteHandle {
    task: Option<JoinHandle<()>>,
}

impl WriteHandle {
    /// A handle for a write that was never scheduled.
    pub const fn noop() -> Self {
        Self { task: None }
    }

    /// Whether no write was scheduled for this handle.
    pub const fn is_noop(&self) -> bool {
        self.task.is_none()
    }

    /// Whether the write has finished (or was never scheduled).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the write to settle. Always completes with `()`.
    pub async fn settled(self) {
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                tracing::debug!(target: DIAGNOSTICS, error = %e, "Background write did not complete");
            }
        }
    }
}

/// Spawn `write` on the current tokio runtime.
///
/// Outside a runtime the write is dropped with a diagnostic instead of
/// panicking, so instrumentation can be called from any context.
pub fn spawn_write<F>(what: &'static str, write: F) -> WriteHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => WriteHandle {
            task: Some(runtime.spawn(write)),
        },
        Err(e) => {
            tracing::debug!(target: DIAGNOSTICS, what, error = %e, "No async runtime, write dropped");
            WriteHandle::noop()
        }
    }
}
