//! Request queue module
//!
//! Bounded-concurrency FIFO admission for outgoing requests.
//!
//! A caller waits for a [`Slot`] and holds it for the duration of its
//! transport call. Slots are handed out strictly in enqueue order and at
//! most `concurrency` are alive at once. Releasing a slot (dropping it)
//! admits exactly one waiter.

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Default number of simultaneous in-flight requests
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Returned to waiters discarded by [`ConcurrencyQueue::clear`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request queue cleared before dispatch")]
pub struct QueueCleared;

#[derive(Debug, Default)]
struct QueueState {
    active: usize,
    waiting: VecDeque<oneshot::Sender<Slot>>,
}

#[derive(Debug)]
struct Shared {
    concurrency: usize,
    state: Mutex<QueueState>,
}

impl QueueState {
    /// Forget waiters whose receiving future was dropped
    fn prune(&mut self) {
        self.waiting.retain(|sender| !sender.is_closed());
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit waiters while slots are free
    fn drain(self: &Arc<Self>) {
        loop {
            let sender = {
                let mut state = self.lock();
                if state.active >= self.concurrency {
                    return;
                }
                match state.waiting.pop_front() {
                    Some(sender) => {
                        state.active += 1;
                        sender
                    }
                    None => return,
                }
            };

            let slot = Slot {
                shared: Arc::clone(self),
                armed: true,
            };
            if let Err(mut slot) = sender.send(slot) {
                // Waiter went away before admission; hand the slot to the next one
                slot.armed = false;
                let mut state = self.lock();
                state.active = state.active.saturating_sub(1);
            }
        }
    }

    fn release(self: &Arc<Self>) {
        {
            let mut state = self.lock();
            state.active = state.active.saturating_sub(1);
        }
        self.drain();
    }
}

/// An admission slot. The slot is returned to the queue when dropped.
#[derive(Debug)]
pub struct Slot {
    shared: Arc<Shared>,
    armed: bool,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if self.armed {
            self.shared.release();
        }
    }
}

/// Bounded-concurrency scheduler with strict FIFO admission
#[derive(Debug, Clone)]
pub struct ConcurrencyQueue {
    shared: Arc<Shared>,
}

impl ConcurrencyQueue {
    /// Create a queue admitting at most `concurrency` tasks at once (minimum 1)
    pub fn new(concurrency: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                concurrency: concurrency.max(1),
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Wait for an admission slot
    pub async fn acquire(&self) -> std::result::Result<Slot, QueueCleared> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.shared.lock();
            state.prune();
            state.waiting.push_back(tx);
            debug!(
                active = state.active,
                pending = state.waiting.len(),
                "Request enqueued"
            );
        }
        self.shared.drain();
        rx.await.map_err(|_| QueueCleared)
    }

    /// Run a task once a slot is free, settling with the task's outcome
    pub async fn run<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _slot = self
            .acquire()
            .await
            .map_err(|e| Error::abort(e.to_string()))?;
        task.await
    }

    /// Discard every task that has not started yet.
    ///
    /// Discarded callers settle with [`QueueCleared`]. Tasks already holding
    /// a slot keep running.
    pub fn clear(&self) -> usize {
        let discarded = {
            let mut state = self.shared.lock();
            state.prune();
            std::mem::take(&mut state.waiting)
        };
        let count = discarded.len();
        if count > 0 {
            warn!(discarded = count, "Request queue cleared");
        }
        drop(discarded);
        count
    }

    /// Number of tasks currently holding a slot
    pub fn active(&self) -> usize {
        self.shared.lock().active
    }

    /// Number of tasks waiting for a slot
    pub fn pending(&self) -> usize {
        let mut state = self.shared.lock();
        state.prune();
        state.waiting.len()
    }

    /// Maximum number of simultaneous slots
    pub fn concurrency(&self) -> usize {
        self.shared.concurrency
    }
}

impl Default for ConcurrencyQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests;
