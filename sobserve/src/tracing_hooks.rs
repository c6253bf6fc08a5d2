//! Tracing-based observability hooks for generation calls.
//!
//! ```rust
//! use scall::CallLifecycleHooks;
//! use sobserve::TracingCallHooks;
//!
//! fn accepts_call_hooks(_hooks: &dyn CallLifecycleHooks) {}
//!
//! let hooks = TracingCallHooks;
//! accepts_call_hooks(&hooks);
//! ```

use std::time::Duration;

use scall::{CallKey, CallLifecycleHooks, SuppressReason};
use sprovider::ProviderError;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCallHooks;

impl CallLifecycleHooks for TracingCallHooks {
    fn on_call_scheduled(&self, call: &CallKey, delay: Duration) {
        tracing::debug!(
            phase = "call",
            event = "scheduled",
            kind = %call.kind,
            provider = %call.provider,
            fingerprint = %call.fingerprint,
            delay_ms = delay.as_millis() as u64
        );
    }

    fn on_call_superseded(&self, superseded: &CallKey, replacement: &CallKey) {
        tracing::debug!(
            phase = "call",
            event = "superseded",
            kind = %superseded.kind,
            provider = %superseded.provider,
            fingerprint = %superseded.fingerprint,
            replacement = %replacement.fingerprint
        );
    }

    fn on_call_suppressed(&self, call: &CallKey, reason: SuppressReason) {
        tracing::info!(
            phase = "call",
            event = "suppressed",
            kind = %call.kind,
            provider = %call.provider,
            fingerprint = %call.fingerprint,
            reason = ?reason
        );
    }

    fn on_call_started(&self, call: &CallKey) {
        tracing::info!(
            phase = "call",
            event = "started",
            kind = %call.kind,
            provider = %call.provider,
            fingerprint = %call.fingerprint
        );
    }

    fn on_call_completed(&self, call: &CallKey, elapsed: Duration, chars: usize) {
        tracing::info!(
            phase = "call",
            event = "completed",
            kind = %call.kind,
            provider = %call.provider,
            fingerprint = %call.fingerprint,
            elapsed_ms = elapsed.as_millis() as u64,
            chars
        );
    }

    fn on_call_failed(&self, call: &CallKey, error: &ProviderError, elapsed: Duration) {
        tracing::error!(
            phase = "call",
            event = "failed",
            kind = %call.kind,
            provider = %call.provider,
            fingerprint = %call.fingerprint,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_call_cancelled(&self, call: &CallKey, elapsed: Duration) {
        tracing::info!(
            phase = "call",
            event = "cancelled",
            kind = %call.kind,
            provider = %call.provider,
            fingerprint = %call.fingerprint,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_stale_purged(&self, call: &CallKey, age: Duration) {
        tracing::warn!(
            phase = "call",
            event = "stale_purged",
            kind = %call.kind,
            provider = %call.provider,
            fingerprint = %call.fingerprint,
            age_ms = age.as_millis() as u64
        );
    }
}
