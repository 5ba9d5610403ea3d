//! The lifecycle state machine and the in-flight work counter.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// The server's lifecycle position. Transitions are one-way:
///
/// ```text
/// Uninitialized --initialize-->  Initializing
/// Initializing  --initialized--> Running
/// any pre-shutdown --shutdown--> ShuttingDown
/// ShuttingDown  --exit-->        (process terminates)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Initializing = 1,
    Running = 2,
    ShuttingDown = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Uninitialized,
            1 => LifecycleState::Initializing,
            2 => LifecycleState::Running,
            _ => LifecycleState::ShuttingDown,
        }
    }
}

/// Linearizable lifecycle state, advanced only by compare-and-swap.
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Uninitialized as u8),
        }
    }

    pub(crate) fn current(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Atomically advance `from` → `to`. Returns false if the state moved.
    pub(crate) fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Enter ShuttingDown from whatever pre-shutdown state the server is in.
    ///
    /// Returns true for the transition that won; false if the server was
    /// already shutting down.
    pub(crate) fn begin_shutdown(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::ShuttingDown)
            || self.transition(LifecycleState::Initializing, LifecycleState::ShuttingDown)
            || self.transition(LifecycleState::Uninitialized, LifecycleState::ShuttingDown)
    }
}

/// Counts in-flight handler invocations so exit can drain them.
pub(crate) struct PendingWork {
    count: AtomicUsize,
    drained: Notify,
}

impl PendingWork {
    pub(crate) fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    /// Mark one invocation in flight. The guard releases it on drop, unwind
    /// included.
    pub(crate) fn begin(work: &Arc<PendingWork>) -> PendingWorkGuard {
        work.count.fetch_add(1, Ordering::SeqCst);
        PendingWorkGuard {
            work: Arc::clone(work),
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait until no invocations are in flight, bounded by `timeout`.
    ///
    /// Returns true when fully drained, false on timeout.
    pub(crate) async fn wait_idle(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                // Register before checking so a concurrent drop cannot slip
                // between the check and the await.
                let notified = self.drained.notified();
                if self.count.load(Ordering::SeqCst) == 0 {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

pub(crate) struct PendingWorkGuard {
    work: Arc<PendingWork>,
}

impl Drop for PendingWorkGuard {
    fn drop(&mut self) {
        if self.work.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.work.drained.notify_waiters();
        }
    }
}
