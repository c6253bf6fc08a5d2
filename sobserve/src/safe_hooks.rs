use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use scall::{CallKey, CallLifecycleHooks, SuppressReason};
use sprovider::ProviderError;

/// Swallows panics raised by the wrapped hooks so they never reach call bookkeeping.
pub struct SafeCallHooks<H> {
    inner: H,
}

impl<H> SafeCallHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> CallLifecycleHooks for SafeCallHooks<H>
where
    H: CallLifecycleHooks,
{
    fn on_call_scheduled(&self, call: &CallKey, delay: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_scheduled(call, delay)
        }));
    }

    fn on_call_superseded(&self, superseded: &CallKey, replacement: &CallKey) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_superseded(superseded, replacement)
        }));
    }

    fn on_call_suppressed(&self, call: &CallKey, reason: SuppressReason) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_suppressed(call, reason)
        }));
    }

    fn on_call_started(&self, call: &CallKey) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_call_started(call)));
    }

    fn on_call_completed(&self, call: &CallKey, elapsed: Duration, chars: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_completed(call, elapsed, chars)
        }));
    }

    fn on_call_failed(&self, call: &CallKey, error: &ProviderError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_failed(call, error, elapsed)
        }));
    }

    fn on_call_cancelled(&self, call: &CallKey, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_cancelled(call, elapsed)
        }));
    }

    fn on_stale_purged(&self, call: &CallKey, age: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_stale_purged(call, age)));
    }
}
