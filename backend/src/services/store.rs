//! Schedule store: the single owner of [`ScheduleState`].
//!
//! Every write goes through [`ScheduleStore::dispatch`], which runs the
//! reducer under one lock, publishes the new snapshot to subscribers and
//! forwards trigger actions to the [`EffectQueue`] drained by the
//! synchronization controller.

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::reducer::{reduce, Action, ScheduleState};
use crate::models::ScheduleGrid;

/// Source of the timestamps stamped into the state.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: std::time::Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        *self.now.lock() += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

struct StoreInner {
    state: Mutex<Arc<ScheduleState>>,
    clock: Arc<dyn Clock>,
    effects: mpsc::UnboundedSender<Action>,
    snapshots: watch::Sender<Arc<ScheduleState>>,
}

#[derive(Clone)]
pub struct ScheduleStore {
    inner: Arc<StoreInner>,
}

/// Trigger actions waiting for the synchronization controller, in dispatch order.
pub struct EffectQueue {
    receiver: mpsc::UnboundedReceiver<Action>,
}

impl EffectQueue {
    pub async fn next(&mut self) -> Option<Action> {
        self.receiver.recv().await
    }

    pub fn try_next(&mut self) -> Option<Action> {
        self.receiver.try_recv().ok()
    }
}

impl ScheduleStore {
    pub fn new(clock: Arc<dyn Clock>) -> (Self, EffectQueue) {
        let (effects, receiver) = mpsc::unbounded_channel();
        let initial = Arc::new(ScheduleState::new());
        let (snapshots, _) = watch::channel(initial.clone());
        let store = Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(initial),
                clock,
                effects,
                snapshots,
            }),
        };
        (store, EffectQueue { receiver })
    }

    /// Apply an action and return the resulting snapshot.
    pub fn dispatch(&self, action: Action) -> Arc<ScheduleState> {
        let mut state = self.inner.state.lock();
        let next = Arc::new(reduce(&state, &action, self.inner.clock.now()));
        *state = next.clone();

        // Sent under the lock so the queue order matches the state order.
        if action.requires_sync() {
            if let Err(e) = self.inner.effects.send(action) {
                debug!("no controller listening, dropping {}", e.0.name());
            }
        }
        self.inner.snapshots.send_replace(next.clone());
        next
    }

    pub fn snapshot(&self) -> Arc<ScheduleState> {
        self.inner.state.lock().clone()
    }

    pub fn grid(&self) -> ScheduleGrid {
        self.snapshot().grid.clone()
    }

    /// Receive a new snapshot after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ScheduleState>> {
        self.inner.snapshots.subscribe()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }
}
