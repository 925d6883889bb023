//! Cancellable delayed tasks and keyed debouncing

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to one delayed task.
///
/// Dropping the handle leaves the task scheduled; call [`Scheduled::cancel`]
/// to suppress it. Cancellation only wins before the delay elapses; once the
/// task body has started it runs to completion.
#[derive(Debug)]
pub struct Scheduled {
    token: CancellationToken,
    /// `None` when no runtime was available and the task was dropped
    handle: Option<JoinHandle<()>>,
}

impl Scheduled {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait until the task has either run or been cancelled
    pub async fn join(self) {
        let Some(handle) = self.handle else {
            return;
        };
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "scheduled task panicked");
        }
    }
}

/// Spawns delayed tasks that share one cancellation root.
///
/// Tasks run on the runtime that was current when the scheduler was built, so
/// `schedule` may be called from any thread. A scheduler built outside a
/// runtime falls back to the caller's runtime, and drops the task with a
/// warning if there is none.
#[derive(Debug)]
pub struct Scheduler {
    runtime: Option<Handle>,
    root: Mutex<CancellationToken>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            runtime: Handle::try_current().ok(),
            root: Mutex::new(CancellationToken::new()),
        }
    }

    /// Run `task` after `delay` unless cancelled first
    pub fn schedule<F>(&self, delay: Duration, task: F) -> Scheduled
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self
            .root
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .child_token();

        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            tracing::warn!("no async runtime available, dropping scheduled task");
            token.cancel();
            return Scheduled {
                token,
                handle: None,
            };
        };

        let guard = token.clone();
        let handle = runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(delay) => task.await,
            }
        });

        Scheduled {
            token,
            handle: Some(handle),
        }
    }

    /// Cancel everything scheduled so far; later calls to `schedule` are unaffected
    pub fn cancel_all(&self) {
        let mut root = self.root.lock().unwrap_or_else(PoisonError::into_inner);
        root.cancel();
        *root = CancellationToken::new();
    }
}

/// Coalesces repeated calls per key into one task fired after a quiet period
#[derive(Debug)]
pub struct Debouncer<K> {
    delay: Duration,
    scheduler: Scheduler,
    pending: Mutex<HashMap<K, Scheduled>>,
}

impl<K: Eq + Hash> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            scheduler: Scheduler::new(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// (Re)start the quiet period for `key`; only the latest `task` runs
    pub fn call<F>(&self, key: K, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|_, scheduled| !scheduled.is_finished());
        if let Some(previous) = pending.remove(&key) {
            previous.cancel();
        }
        pending.insert(key, self.scheduler.schedule(self.delay, task));
    }

    /// Cancel the pending task for `key`; returns whether one was still waiting
    pub fn cancel(&self, key: &K) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.remove(key) {
            Some(scheduled) => {
                let waiting = !scheduled.is_finished();
                scheduled.cancel();
                waiting
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.clear();
        self.scheduler.cancel_all();
    }

    /// Number of keys still inside their quiet period
    pub fn pending(&self) -> usize {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.values().filter(|s| !s.is_finished()).count()
    }
}
