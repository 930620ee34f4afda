//! Cancel-and-reschedule timer for coalescing bursts of work.
//!
//! Each [`Debouncer::schedule`] call replaces the pending timer, so a burst
//! of calls closer together than the window runs the task once, one window
//! after the last call. When the timer fires the task is spawned detached:
//! later calls never cancel a task that is already running.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Runs the most recently scheduled task after a quiet period.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// The quiet period.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Arm the timer for `task`, replacing any task still waiting.
    ///
    /// Returns `false` without scheduling when called outside a Tokio
    /// runtime.
    pub fn schedule<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, task not scheduled");
            return false;
        };

        let window = self.window;
        let spawner = runtime.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(window).await;
            spawner.spawn(task);
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
        true
    }

    /// Disarm the timer. Returns whether a task was waiting.
    pub fn cancel(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a task is waiting for its window to elapse.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(timer) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
    }
}
