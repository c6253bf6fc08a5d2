//! Active-call registry keyed by fingerprint.
//!
//! Holds at most one active entry per fingerprint, suppresses identical calls
//! that completed within the duplicate window, and treats entries older than
//! the staleness threshold as abandoned. Admission only expires the entry of
//! the fingerprint being submitted; [`CallRegistry::purge_stale`] sweeps every
//! entry and is meant for periodic maintenance.
//!
//! An expired call settles as [`CallOutcome::Expired`] so its owner can report
//! it instead of dropping it silently.
//!
//! ```rust
//! use scall::{Admission, CallKey, CallKind, CallRegistry, Fingerprint};
//! use sprovider::ProviderId;
//!
//! let registry = CallRegistry::new();
//! let key = CallKey::new(Fingerprint::from("impression-gemini-1"), CallKind::Impression, ProviderId::Gemini);
//!
//! let Admission::Accepted(handle) = registry.admit(key.clone()) else {
//!     panic!("first admission should be accepted");
//! };
//! assert!(matches!(registry.admit(key), Admission::Suppressed(_)));
//!
//! assert!(registry.cancel_call(&handle));
//! assert!(handle.is_cancelled());
//! assert_eq!(registry.active_count(), 0);
//! ```

use std::cell::Cell;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use scommon::{IdSequence, Registry};
use sprovider::ProviderError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::settings::{DEFAULT_DUPLICATE_WINDOW, DEFAULT_HISTORY_RETENTION, DEFAULT_STALE_AFTER};
use crate::{CallKey, CallKind, CallLifecycleHooks, CallSettings, Fingerprint, NoopCallHooks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    /// An identical call is still running.
    ActiveDuplicate,
    /// An identical call completed within the duplicate window.
    RecentlyCompleted,
}

thread_local! {
    // Deliveries in progress on this thread, so a callback that cancels
    // does not wait on its own gate.
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

struct DeliveringScope;

impl DeliveringScope {
    fn enter() -> Self {
        DELIVERING.with(|depth| depth.set(depth.get() + 1));
        Self
    }

    fn active() -> bool {
        DELIVERING.with(|depth| depth.get() > 0)
    }
}

impl Drop for DeliveringScope {
    fn drop(&mut self) {
        DELIVERING.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// State shared by a call's handle and its registry entry.
#[derive(Debug, Default)]
struct CallControl {
    gate: Mutex<()>,
    expired: AtomicBool,
}

impl CallControl {
    fn gate(&self) -> MutexGuard<'_, ()> {
        self.gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cancels `token` once no delivery for this call is in progress on
    /// another thread.
    fn cancel(&self, token: &CancellationToken) {
        if DeliveringScope::active() {
            token.cancel();
            return;
        }
        let _gate = self.gate();
        token.cancel();
    }
}

/// Caller-side view of an admitted call.
#[derive(Debug, Clone)]
pub struct CallHandle {
    call_id: u64,
    key: CallKey,
    token: CancellationToken,
    control: Arc<CallControl>,
}

impl CallHandle {
    pub fn id(&self) -> u64 {
        self.call_id
    }

    pub fn key(&self) -> &CallKey {
        &self.key
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the registry purged this call as stale.
    pub fn is_expired(&self) -> bool {
        self.control.expired.load(Ordering::SeqCst)
    }

    /// Runs `deliver` unless the call is cancelled and reports whether it ran.
    ///
    /// Cancelling from another thread waits for a delivery in progress, so
    /// nothing is delivered after the cancelling call returns.
    pub fn deliver(&self, deliver: impl FnOnce()) -> bool {
        let _gate = self.control.gate();
        if self.token.is_cancelled() {
            return false;
        }
        let _scope = DeliveringScope::enter();
        deliver();
        true
    }
}

#[derive(Debug)]
pub enum Admission {
    Accepted(CallHandle),
    Suppressed(SuppressReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Completed(String),
    Failed(ProviderError),
    /// Cancelled explicitly; nothing is reported.
    Cancelled,
    /// Purged as stale before it settled.
    Expired,
    Suppressed(SuppressReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveCallInfo {
    pub call_id: u64,
    pub key: CallKey,
    pub age: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrySnapshot {
    pub active: Vec<ActiveCallInfo>,
    pub history_len: usize,
}

#[derive(Debug)]
struct ActiveCallEntry {
    call_id: u64,
    key: CallKey,
    token: CancellationToken,
    control: Arc<CallControl>,
    started_at: Instant,
}

#[derive(Debug, Default)]
struct RegistryState {
    active: Registry<Fingerprint, ActiveCallEntry>,
    history: Registry<Fingerprint, Instant>,
}

pub struct CallRegistry {
    stale_after: Duration,
    duplicate_window: Duration,
    history_retention: Duration,
    hooks: Arc<dyn CallLifecycleHooks>,
    ids: IdSequence,
    state: Mutex<RegistryState>,
}

impl Default for CallRegistry {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            history_retention: DEFAULT_HISTORY_RETENTION,
            hooks: Arc::new(NoopCallHooks),
            ids: IdSequence::new(),
            state: Mutex::new(RegistryState::default()),
        }
    }
}

impl std::fmt::Debug for CallRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallRegistry")
            .field("stale_after", &self.stale_after)
            .field("duplicate_window", &self.duplicate_window)
            .field("history_retention", &self.history_retention)
            .finish_non_exhaustive()
    }
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &CallSettings) -> Self {
        Self::new()
            .with_stale_after(settings.stale_after)
            .with_duplicate_window(settings.duplicate_window)
            .with_history_retention(settings.history_retention)
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_duplicate_window(mut self, duplicate_window: Duration) -> Self {
        self.duplicate_window = duplicate_window;
        self
    }

    pub fn with_history_retention(mut self, history_retention: Duration) -> Self {
        self.history_retention = history_retention;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn CallLifecycleHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Expires a stale entry for the same fingerprint, runs the duplicate
    /// checks, then registers the call. Other entries are left alone.
    pub fn admit(&self, key: CallKey) -> Admission {
        let now = Instant::now();
        let (purged, admission) = {
            let mut state = self.state();
            let purged = self.take_stale_entry(&mut state, &key.fingerprint, now);

            let admission = if state.active.contains_key(&key.fingerprint) {
                Admission::Suppressed(SuppressReason::ActiveDuplicate)
            } else if state
                .history
                .get(&key.fingerprint)
                .is_some_and(|completed_at| now.duration_since(*completed_at) < self.duplicate_window)
            {
                Admission::Suppressed(SuppressReason::RecentlyCompleted)
            } else {
                let handle = CallHandle {
                    call_id: self.ids.next_id(),
                    key: key.clone(),
                    token: CancellationToken::new(),
                    control: Arc::new(CallControl::default()),
                };
                state.active.insert(
                    key.fingerprint.clone(),
                    ActiveCallEntry {
                        call_id: handle.call_id,
                        key: key.clone(),
                        token: handle.token.clone(),
                        control: Arc::clone(&handle.control),
                        started_at: now,
                    },
                );
                Admission::Accepted(handle)
            };
            (purged, admission)
        };

        self.expire(purged.as_slice(), now);
        match &admission {
            Admission::Accepted(handle) => self.hooks.on_call_started(handle.key()),
            Admission::Suppressed(reason) => self.hooks.on_call_suppressed(&key, *reason),
        }
        admission
    }

    /// Admits `key`, runs `executor` with the call handle and settles the entry.
    ///
    /// `executor` is never invoked for a suppressed call.
    pub async fn submit<F, Fut>(&self, key: CallKey, executor: F) -> CallOutcome
    where
        F: FnOnce(CallHandle) -> Fut,
        Fut: Future<Output = Result<String, ProviderError>>,
    {
        let handle = match self.admit(key) {
            Admission::Accepted(handle) => handle,
            Admission::Suppressed(reason) => return CallOutcome::Suppressed(reason),
        };

        let result = executor(handle.clone()).await;
        self.settle(&handle, result)
    }

    /// Records the executor result for `handle`, unless the call was cancelled
    /// or expired meanwhile.
    pub fn settle(&self, handle: &CallHandle, result: Result<String, ProviderError>) -> CallOutcome {
        if handle.is_expired() {
            return CallOutcome::Expired;
        }
        if handle.is_cancelled() {
            return CallOutcome::Cancelled;
        }

        match result {
            Ok(text) if self.complete(handle, &text) => CallOutcome::Completed(text),
            Err(error) if self.fail(handle, &error) => CallOutcome::Failed(error),
            _ if handle.is_expired() => CallOutcome::Expired,
            _ => CallOutcome::Cancelled,
        }
    }

    /// Removes the entry and records it in history. Returns `false` when the
    /// entry is no longer owned by `handle`.
    pub fn complete(&self, handle: &CallHandle, text: &str) -> bool {
        let now = Instant::now();
        let removed = {
            let mut state = self.state();
            let removed = Self::take_if_current(&mut state, handle);
            if removed.is_some() {
                state.history.insert(handle.key.fingerprint.clone(), now);
            }
            removed
        };

        match removed {
            Some(entry) => {
                self.hooks.on_call_completed(
                    &entry.key,
                    now.duration_since(entry.started_at),
                    text.chars().count(),
                );
                true
            }
            None => false,
        }
    }

    /// Removes the entry without recording history so an immediate retry is allowed.
    pub fn fail(&self, handle: &CallHandle, error: &ProviderError) -> bool {
        let removed = Self::take_if_current(&mut self.state(), handle);
        match removed {
            Some(entry) => {
                self.hooks
                    .on_call_failed(&entry.key, error, entry.started_at.elapsed());
                true
            }
            None => false,
        }
    }

    pub fn cancel(&self, fingerprint: &Fingerprint) -> bool {
        let removed = self.state().active.remove(fingerprint);
        match removed {
            Some(entry) => {
                self.finish_cancelled(entry);
                true
            }
            None => false,
        }
    }

    /// Cancels the entry only if it still belongs to `handle`.
    pub fn cancel_call(&self, handle: &CallHandle) -> bool {
        let removed = Self::take_if_current(&mut self.state(), handle);
        match removed {
            Some(entry) => {
                self.finish_cancelled(entry);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) -> usize {
        let removed = self.state().active.drain();
        let count = removed.len();
        for (_, entry) in removed {
            self.finish_cancelled(entry);
        }
        count
    }

    pub fn cancel_by_kind(&self, kind: CallKind) -> usize {
        let removed = self
            .state()
            .active
            .extract_if(|_, entry| entry.key.kind == kind);
        let count = removed.len();
        for (_, entry) in removed {
            self.finish_cancelled(entry);
        }
        count
    }

    /// Expires every entry older than the staleness threshold.
    pub fn purge_stale(&self) -> usize {
        let now = Instant::now();
        let purged = self.take_stale(&mut self.state(), now);
        self.expire(&purged, now);
        purged.len()
    }

    /// Drops history entries older than the retention window.
    pub fn prune_history(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state();
        let before = state.history.len();
        state
            .history
            .retain(|_, completed_at| now.duration_since(*completed_at) <= self.history_retention);
        before - state.history.len()
    }

    pub fn clear_history(&self) {
        self.state().history.clear();
    }

    pub fn is_active(&self, fingerprint: &Fingerprint) -> bool {
        self.state().active.contains_key(fingerprint)
    }

    pub fn active_count(&self) -> usize {
        self.state().active.len()
    }

    pub fn active_calls_of_kind(&self, kind: CallKind) -> usize {
        self.state()
            .active
            .values()
            .filter(|entry| entry.key.kind == kind)
            .count()
    }

    pub fn has_active_calls(&self) -> bool {
        !self.state().active.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.state().history.len()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let now = Instant::now();
        let state = self.state();
        let mut active = state
            .active
            .values()
            .map(|entry| ActiveCallInfo {
                call_id: entry.call_id,
                key: entry.key.clone(),
                age: now.duration_since(entry.started_at),
            })
            .collect::<Vec<_>>();
        active.sort_by_key(|info| info.call_id);

        RegistrySnapshot {
            active,
            history_len: state.history.len(),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_if_current(state: &mut RegistryState, handle: &CallHandle) -> Option<ActiveCallEntry> {
        let owned = state
            .active
            .get(&handle.key.fingerprint)
            .is_some_and(|entry| entry.call_id == handle.call_id);
        if owned {
            state.active.remove(&handle.key.fingerprint)
        } else {
            None
        }
    }

    fn is_stale(&self, entry: &ActiveCallEntry, now: Instant) -> bool {
        now.duration_since(entry.started_at) > self.stale_after
    }

    fn take_stale_entry(
        &self,
        state: &mut RegistryState,
        fingerprint: &Fingerprint,
        now: Instant,
    ) -> Option<ActiveCallEntry> {
        let stale = state
            .active
            .get(fingerprint)
            .is_some_and(|entry| self.is_stale(entry, now));
        let entry = if stale { state.active.remove(fingerprint) } else { None };
        if let Some(entry) = &entry {
            entry.control.expired.store(true, Ordering::SeqCst);
        }
        entry
    }

    fn take_stale(&self, state: &mut RegistryState, now: Instant) -> Vec<ActiveCallEntry> {
        state
            .active
            .extract_if(|_, entry| self.is_stale(entry, now))
            .into_iter()
            .map(|(_, entry)| {
                entry.control.expired.store(true, Ordering::SeqCst);
                entry
            })
            .collect()
    }

    // Tokens are cancelled outside the state lock: a delivery holds its gate
    // while reading the registry.
    fn expire(&self, purged: &[ActiveCallEntry], now: Instant) {
        for entry in purged {
            entry.control.cancel(&entry.token);
            self.hooks
                .on_stale_purged(&entry.key, now.duration_since(entry.started_at));
        }
    }

    fn finish_cancelled(&self, entry: ActiveCallEntry) {
        entry.control.cancel(&entry.token);
        self.hooks
            .on_call_cancelled(&entry.key, entry.started_at.elapsed());
    }
}
