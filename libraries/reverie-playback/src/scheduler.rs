//! Timer seam
//!
//! The engine never sleeps. It asks a [`Scheduler`] for single-shot timers
//! and the host calls [`PlaybackController::on_timer`](crate::PlaybackController::on_timer)
//! when one fires. Ids are never reused, so a late delivery of a cancelled
//! timer is recognised as stale.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handle to one scheduled single-shot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

impl TimerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Single-shot timer source
pub trait Scheduler {
    /// Arrange for `id` to be delivered to the controller after `delay`
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Forget a timer. Cancelling an unknown or fired id is a no-op.
    fn cancel(&mut self, id: TimerId);
}

/// Timer waiting to be fired by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub delay: Duration,
}

/// Scheduler the host drives explicitly
///
/// Records timers instead of running them. Deterministic hosts and tests
/// pop them with [`fire_next`](Self::fire_next) and hand the id to the
/// controller.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers scheduled and not yet fired or cancelled, oldest first
    pub fn pending(&self) -> &[PendingTimer] {
        &self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the oldest pending timer
    pub fn fire_next(&mut self) -> Option<TimerId> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0).id)
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(PendingTimer { id, delay });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|timer| timer.id != id);
    }
}

#[cfg(feature = "tokio-driver")]
pub use driver::TokioScheduler;

#[cfg(feature = "tokio-driver")]
mod driver {
    use super::{Scheduler, TimerId};
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;

    /// Scheduler backed by tokio timers
    ///
    /// Each timer is a task that sleeps and then sends its id on the channel
    /// returned by [`TokioScheduler::new`]. The host loop receives ids and
    /// passes them to `PlaybackController::on_timer`. Must be created inside
    /// a tokio runtime.
    #[derive(Debug)]
    pub struct TokioScheduler {
        next_id: u64,
        tasks: HashMap<TimerId, JoinHandle<()>>,
        fired: mpsc::UnboundedSender<TimerId>,
    }

    impl TokioScheduler {
        pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
            let (fired, rx) = mpsc::unbounded_channel();
            (
                Self {
                    next_id: 0,
                    tasks: HashMap::new(),
                    fired,
                },
                rx,
            )
        }

        /// Timers whose tasks are still sleeping
        pub fn active_timers(&self) -> usize {
            self.tasks.values().filter(|task| !task.is_finished()).count()
        }
    }

    impl Scheduler for TokioScheduler {
        fn schedule(&mut self, delay: Duration) -> TimerId {
            self.tasks.retain(|_, task| !task.is_finished());

            self.next_id += 1;
            let id = TimerId(self.next_id);
            let fired = self.fired.clone();

            let task = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // Receiver gone means the host shut down
                let _ = fired.send(id);
            });

            self.tasks.insert(id, task);
            id
        }

        fn cancel(&mut self, id: TimerId) {
            if let Some(task) = self.tasks.remove(&id) {
                task.abort();
            }
        }
    }

    impl Drop for TokioScheduler {
        fn drop(&mut self) {
            for (_, task) in self.tasks.drain() {
                task.abort();
            }
        }
    }
}
