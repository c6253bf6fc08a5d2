//! Metrics-based observability hooks for generation calls.
//!
//! ```rust
//! use scall::CallLifecycleHooks;
//! use sobserve::MetricsCallHooks;
//!
//! fn accepts_call_hooks(_hooks: &dyn CallLifecycleHooks) {}
//!
//! let hooks = MetricsCallHooks;
//! accepts_call_hooks(&hooks);
//! ```

use std::time::Duration;

use scall::{CallKey, CallLifecycleHooks, SuppressReason};
use sprovider::ProviderError;

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCallHooks;

impl CallLifecycleHooks for MetricsCallHooks {
    fn on_call_scheduled(&self, call: &CallKey, _delay: Duration) {
        metrics::counter!(
            "sonoscribe_call_scheduled_total",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string()
        )
        .increment(1);
    }

    fn on_call_superseded(&self, superseded: &CallKey, _replacement: &CallKey) {
        metrics::counter!(
            "sonoscribe_call_superseded_total",
            "kind" => superseded.kind.as_str(),
            "provider" => superseded.provider.to_string()
        )
        .increment(1);
    }

    fn on_call_suppressed(&self, call: &CallKey, reason: SuppressReason) {
        metrics::counter!(
            "sonoscribe_call_suppressed_total",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string(),
            "reason" => format!("{reason:?}")
        )
        .increment(1);
    }

    fn on_call_started(&self, call: &CallKey) {
        metrics::counter!(
            "sonoscribe_call_started_total",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string()
        )
        .increment(1);
    }

    fn on_call_completed(&self, call: &CallKey, elapsed: Duration, chars: usize) {
        metrics::counter!(
            "sonoscribe_call_completed_total",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "sonoscribe_call_duration_seconds",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string(),
            "status" => "completed"
        )
        .record(elapsed.as_secs_f64());
        metrics::histogram!(
            "sonoscribe_call_output_chars",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string()
        )
        .record(chars as f64);
    }

    fn on_call_failed(&self, call: &CallKey, error: &ProviderError, elapsed: Duration) {
        metrics::counter!(
            "sonoscribe_call_failed_total",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "sonoscribe_call_duration_seconds",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string(),
            "status" => "failed"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_call_cancelled(&self, call: &CallKey, elapsed: Duration) {
        metrics::counter!(
            "sonoscribe_call_cancelled_total",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "sonoscribe_call_duration_seconds",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string(),
            "status" => "cancelled"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_stale_purged(&self, call: &CallKey, age: Duration) {
        metrics::counter!(
            "sonoscribe_call_stale_purged_total",
            "kind" => call.kind.as_str(),
            "provider" => call.provider.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "sonoscribe_call_stale_age_seconds",
            "kind" => call.kind.as_str()
        )
        .record(age.as_secs_f64());
    }
}
