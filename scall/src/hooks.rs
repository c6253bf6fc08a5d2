//! Lifecycle hook contracts for observing generation calls.
//!
//! ```rust
//! use scall::{CallLifecycleHooks, NoopCallHooks};
//!
//! fn accepts_hooks(_hooks: &dyn CallLifecycleHooks) {}
//!
//! let hooks = NoopCallHooks;
//! accepts_hooks(&hooks);
//! ```

use std::time::Duration;

use sprovider::ProviderError;

use crate::{CallKey, SuppressReason};

pub trait CallLifecycleHooks: Send + Sync {
    fn on_call_scheduled(&self, _call: &CallKey, _delay: Duration) {}

    /// A pending (not yet dispatched) call was replaced by a newer one.
    fn on_call_superseded(&self, _superseded: &CallKey, _replacement: &CallKey) {}

    fn on_call_suppressed(&self, _call: &CallKey, _reason: SuppressReason) {}

    fn on_call_started(&self, _call: &CallKey) {}

    fn on_call_completed(&self, _call: &CallKey, _elapsed: Duration, _chars: usize) {}

    fn on_call_failed(&self, _call: &CallKey, _error: &ProviderError, _elapsed: Duration) {}

    fn on_call_cancelled(&self, _call: &CallKey, _elapsed: Duration) {}

    fn on_stale_purged(&self, _call: &CallKey, _age: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallHooks;

impl CallLifecycleHooks for NoopCallHooks {}
