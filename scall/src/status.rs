//! Shared call status state machine with publish/subscribe delivery.
//!
//! `Idle -> Loading -> Streaming -> Completed -> Idle`, with `Error` reachable
//! from any state and left through `Idle` on the next accepted call. A
//! snapshot is only published when it actually changed.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use scall::{CallStatus, StatusBroadcaster};
//!
//! let broadcaster = StatusBroadcaster::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let subscription = broadcaster.subscribe({
//!     let seen = Arc::clone(&seen);
//!     move |snapshot| seen.lock().expect("seen lock").push(snapshot.state)
//! });
//!
//! broadcaster.call_accepted(1);
//! broadcaster.chunk_received(1);
//! broadcaster.call_completed(0);
//! subscription.unsubscribe();
//! broadcaster.call_accepted(1);
//!
//! assert_eq!(
//!     *seen.lock().expect("seen lock"),
//!     vec![
//!         CallStatus::Idle,
//!         CallStatus::Loading,
//!         CallStatus::Streaming,
//!         CallStatus::Completed,
//!         CallStatus::Idle,
//!     ]
//! );
//! ```

use std::fmt::{Debug, Formatter};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use scommon::IdSequence;
use sprovider::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStatus {
    Idle,
    Loading,
    Streaming,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: CallStatus,
    pub error_message: Option<String>,
    pub active_call_count: usize,
    pub current_provider: ProviderId,
}

impl StatusSnapshot {
    fn idle(current_provider: ProviderId) -> Self {
        Self {
            state: CallStatus::Idle,
            error_message: None,
            active_call_count: 0,
            current_provider,
        }
    }
}

type Subscriber = Arc<dyn Fn(&StatusSnapshot) + Send + Sync>;

struct StatusState {
    snapshot: StatusSnapshot,
    subscribers: Vec<(u64, Subscriber)>,
}

struct StatusShared {
    state: Mutex<StatusState>,
    // Serialises transitions with their delivery so subscribers observe
    // snapshots in transition order.
    delivery: Mutex<()>,
    ids: IdSequence,
}

impl StatusShared {
    fn state(&self) -> MutexGuard<'_, StatusState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Idempotent unsubscribe token returned by [`StatusBroadcaster::subscribe`].
///
/// Dropping the token does not unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    shared: Weak<StatusShared>,
}

impl Subscription {
    /// Returns `true` only for the call that actually removed the subscriber.
    pub fn unsubscribe(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let mut state = shared.state();
        let before = state.subscribers.len();
        state.subscribers.retain(|(id, _)| *id != self.id);
        state.subscribers.len() != before
    }
}

#[derive(Clone)]
pub struct StatusBroadcaster {
    shared: Arc<StatusShared>,
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::with_provider(ProviderId::Gemini)
    }
}

impl Debug for StatusShared {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("StatusShared")
            .field("snapshot", &state.snapshot)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

impl Debug for StatusBroadcaster {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StatusBroadcaster")
            .field(&self.shared)
            .finish()
    }
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(current_provider: ProviderId) -> Self {
        Self {
            shared: Arc::new(StatusShared {
                state: Mutex::new(StatusState {
                    snapshot: StatusSnapshot::idle(current_provider),
                    subscribers: Vec::new(),
                }),
                delivery: Mutex::new(()),
                ids: IdSequence::new(),
            }),
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.shared.state().snapshot.clone()
    }

    /// Registers `subscriber` and immediately delivers the current snapshot to it.
    ///
    /// Subscribers run while deliveries are serialised, so they must not
    /// trigger a status transition synchronously.
    pub fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: Fn(&StatusSnapshot) + Send + Sync + 'static,
    {
        let _delivery = self.delivery();
        let id = self.shared.ids.next_id();
        let subscriber: Subscriber = Arc::new(subscriber);
        let snapshot = {
            let mut state = self.shared.state();
            state.subscribers.push((id, Arc::clone(&subscriber)));
            state.snapshot.clone()
        };
        deliver(&[subscriber], &snapshot);

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.state().subscribers.len()
    }

    pub fn clear_subscribers(&self) {
        self.shared.state().subscribers.clear();
    }

    /// `* -> Loading`; a lingering `Error` is first reset to `Idle`.
    pub fn call_accepted(&self, active_call_count: usize) {
        self.transition(|snapshot| {
            let mut steps = Vec::with_capacity(2);
            if snapshot.state == CallStatus::Error {
                snapshot.state = CallStatus::Idle;
                snapshot.error_message = None;
                steps.push(snapshot.clone());
            }
            snapshot.state = CallStatus::Loading;
            snapshot.active_call_count = active_call_count;
            steps.push(snapshot.clone());
            steps
        });
    }

    /// `Loading -> Streaming` on the first chunk; later chunks change nothing.
    pub fn chunk_received(&self, active_call_count: usize) {
        self.transition(|snapshot| {
            if snapshot.state == CallStatus::Loading {
                snapshot.state = CallStatus::Streaming;
            }
            snapshot.active_call_count = active_call_count;
            vec![snapshot.clone()]
        });
    }

    /// `-> Completed`, followed by `-> Idle` when no call remains active.
    pub fn call_completed(&self, active_call_count: usize) {
        self.transition(|snapshot| {
            snapshot.state = CallStatus::Completed;
            snapshot.error_message = None;
            snapshot.active_call_count = active_call_count;
            let mut steps = vec![snapshot.clone()];
            if active_call_count == 0 {
                snapshot.state = CallStatus::Idle;
                steps.push(snapshot.clone());
            }
            steps
        });
    }

    pub fn call_failed(&self, message: impl Into<String>, active_call_count: usize) {
        let message = message.into();
        self.transition(move |snapshot| {
            snapshot.state = CallStatus::Error;
            snapshot.error_message = Some(message);
            snapshot.active_call_count = active_call_count;
            vec![snapshot.clone()]
        });
    }

    /// Records a cancellation; `-> Idle` once no call remains active.
    pub fn call_cancelled(&self, active_call_count: usize) {
        self.transition(|snapshot| {
            snapshot.active_call_count = active_call_count;
            if active_call_count == 0 {
                snapshot.state = CallStatus::Idle;
                snapshot.error_message = None;
            }
            vec![snapshot.clone()]
        });
    }

    pub fn set_provider(&self, provider: ProviderId) {
        self.transition(|snapshot| {
            snapshot.current_provider = provider;
            vec![snapshot.clone()]
        });
    }

    /// Forces `Idle` with no error and no active calls.
    pub fn reset_idle(&self) {
        self.transition(|snapshot| {
            *snapshot = StatusSnapshot::idle(snapshot.current_provider);
            vec![snapshot.clone()]
        });
    }

    fn delivery(&self) -> MutexGuard<'_, ()> {
        self.shared
            .delivery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies `step` and publishes each produced snapshot that differs from
    /// the one published before it.
    fn transition<F>(&self, step: F)
    where
        F: FnOnce(&mut StatusSnapshot) -> Vec<StatusSnapshot>,
    {
        let _delivery = self.delivery();
        let (mut previous, steps, subscribers) = {
            let mut state = self.shared.state();
            let previous = state.snapshot.clone();
            let steps = step(&mut state.snapshot);
            let subscribers = state
                .subscribers
                .iter()
                .map(|(_, subscriber)| Arc::clone(subscriber))
                .collect::<Vec<_>>();
            (previous, steps, subscribers)
        };

        for snapshot in steps {
            if snapshot != previous {
                deliver(&subscribers, &snapshot);
                previous = snapshot;
            }
        }
    }
}

fn deliver(subscribers: &[Subscriber], snapshot: &StatusSnapshot) {
    for subscriber in subscribers {
        if catch_unwind(AssertUnwindSafe(|| subscriber(snapshot))).is_err() {
            tracing::warn!(
                phase = "status",
                event = "subscriber_panicked",
                state = ?snapshot.state
            );
        }
    }
}
