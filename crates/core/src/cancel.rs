//! Cancellable background tasks.
//!
//! A [`CancellationToken`] is the liveness flag a task carries; the matching
//! [`CancellationHandle`] flips it. [`TaskHandle`] bundles the handle with the
//! spawned task, and [`Debouncer`] keeps at most one delayed task pending.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Liveness flag for a spawned task. Cancelled once the handle cancels or is dropped.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    receiver: watch::Receiver<bool>,
}

/// Triggers cancellation for every clone of the paired token.
#[derive(Debug)]
pub struct CancellationHandle {
    sender: watch::Sender<bool>,
}

impl CancellationToken {
    /// Create a new token and the handle that cancels it.
    pub fn new() -> (Self, CancellationHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { receiver: rx }, CancellationHandle { sender: tx })
    }

    pub fn is_cancelled(&self) -> bool {
        // A closed channel means the handle is gone; nobody can keep us alive.
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    /// Resolve once cancellation is requested or the handle is dropped.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

impl CancellationHandle {
    pub fn cancel(&self) {
        // No receivers left is fine.
        let _ = self.sender.send(true);
    }
}

/// A spawned task plus the handle that marks it stale.
///
/// `cancel()` does not abort the task: work already in flight runs to
/// completion and is expected to check its token before touching shared state.
#[derive(Debug)]
pub struct TaskHandle {
    cancel: CancellationHandle,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `work` with a fresh token.
    pub fn spawn<F, Fut>(work: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (token, cancel) = CancellationToken::new();
        let join = tokio::spawn(work(token));
        Self { cancel, join }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

// ---------------------------------------------------------------------------
// Debouncer
// ---------------------------------------------------------------------------

/// Trailing-edge debouncer: scheduling cancels any pending task and starts a
/// new quiet period.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<TaskHandle>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `work` after the quiet period unless another call to `schedule` or
    /// [`Debouncer::cancel`] happens first. Once `work` has started it is not
    /// interrupted; it receives the token so it can detect that it went stale.
    pub fn schedule<F, Fut>(&mut self, work: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(TaskHandle::spawn(move |token| async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => return,
            }
            if token.is_cancelled() {
                return;
            }
            work(token).await;
        }));
    }

    /// Cancel the pending task, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }

    /// True while a scheduled task has not yet finished.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
