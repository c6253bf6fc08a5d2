use std::sync::{Arc, Mutex};
use std::time::Duration;

use scall::{CallKey, CallKind, CallLifecycleHooks, Fingerprint, SuppressReason};
use sprovider::{ProviderError, ProviderId};

use crate::{CompositeCallHooks, MetricsCallHooks, SafeCallHooks, TracingCallHooks};

fn sample_key() -> CallKey {
    CallKey::new(
        Fingerprint::from("impression-gemini-1x2y3z"),
        CallKind::Impression,
        ProviderId::Gemini,
    )
}

fn replacement_key() -> CallKey {
    CallKey::new(
        Fingerprint::from("impression-gemini-9q8w7e"),
        CallKind::Impression,
        ProviderId::Gemini,
    )
}

fn exercise(hooks: &dyn CallLifecycleHooks) {
    let key = sample_key();
    let error = ProviderError::timeout("impression call exceeded 30s");

    hooks.on_call_scheduled(&key, Duration::from_millis(600));
    hooks.on_call_superseded(&key, &replacement_key());
    hooks.on_call_suppressed(&key, SuppressReason::ActiveDuplicate);
    hooks.on_call_started(&key);
    hooks.on_call_completed(&key, Duration::from_millis(1_200), 512);
    hooks.on_call_failed(&key, &error, Duration::from_secs(30));
    hooks.on_call_cancelled(&key, Duration::from_millis(300));
    hooks.on_stale_purged(&key, Duration::from_secs(31));
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise(&TracingCallHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise(&MetricsCallHooks);
}

#[derive(Default, Clone)]
struct RecordingCallHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingCallHooks {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }

    fn events(&self) -> Vec<&'static str> {
        self.events.lock().expect("events lock").clone()
    }
}

impl CallLifecycleHooks for RecordingCallHooks {
    fn on_call_scheduled(&self, _call: &CallKey, _delay: Duration) {
        self.push("scheduled");
    }

    fn on_call_superseded(&self, _superseded: &CallKey, _replacement: &CallKey) {
        self.push("superseded");
    }

    fn on_call_suppressed(&self, _call: &CallKey, _reason: SuppressReason) {
        self.push("suppressed");
    }

    fn on_call_started(&self, _call: &CallKey) {
        self.push("started");
    }

    fn on_call_completed(&self, _call: &CallKey, _elapsed: Duration, _chars: usize) {
        self.push("completed");
    }

    fn on_call_failed(&self, _call: &CallKey, _error: &ProviderError, _elapsed: Duration) {
        self.push("failed");
    }

    fn on_call_cancelled(&self, _call: &CallKey, _elapsed: Duration) {
        self.push("cancelled");
    }

    fn on_stale_purged(&self, _call: &CallKey, _age: Duration) {
        self.push("stale_purged");
    }
}

struct PanicCallHooks;

impl CallLifecycleHooks for PanicCallHooks {
    fn on_call_scheduled(&self, _call: &CallKey, _delay: Duration) {
        panic!("scheduled panic");
    }

    fn on_call_superseded(&self, _superseded: &CallKey, _replacement: &CallKey) {
        panic!("superseded panic");
    }

    fn on_call_suppressed(&self, _call: &CallKey, _reason: SuppressReason) {
        panic!("suppressed panic");
    }

    fn on_call_started(&self, _call: &CallKey) {
        panic!("started panic");
    }

    fn on_call_completed(&self, _call: &CallKey, _elapsed: Duration, _chars: usize) {
        panic!("completed panic");
    }

    fn on_call_failed(&self, _call: &CallKey, _error: &ProviderError, _elapsed: Duration) {
        panic!("failed panic");
    }

    fn on_call_cancelled(&self, _call: &CallKey, _elapsed: Duration) {
        panic!("cancelled panic");
    }

    fn on_stale_purged(&self, _call: &CallKey, _age: Duration) {
        panic!("stale panic");
    }
}

const ALL_EVENTS: [&str; 8] = [
    "scheduled",
    "superseded",
    "suppressed",
    "started",
    "completed",
    "failed",
    "cancelled",
    "stale_purged",
];

#[test]
fn safe_call_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingCallHooks::default();
    let hooks = SafeCallHooks::new(inner.clone());

    exercise(&hooks);

    assert_eq!(inner.events(), ALL_EVENTS);
}

#[test]
fn safe_call_hooks_swallow_panics() {
    let hooks = SafeCallHooks::new(PanicCallHooks);

    exercise(&hooks);
}

#[test]
fn composite_hooks_fan_out_in_registration_order() {
    let first = RecordingCallHooks::default();
    let second = RecordingCallHooks::default();
    let hooks = CompositeCallHooks::new()
        .with(first.clone())
        .with(SafeCallHooks::new(PanicCallHooks))
        .with_shared(Arc::new(second.clone()));
    assert_eq!(hooks.len(), 3);

    exercise(&hooks);

    assert_eq!(first.events(), ALL_EVENTS);
    assert_eq!(second.events(), ALL_EVENTS);
}

#[test]
fn empty_composite_is_a_no_op() {
    let hooks = CompositeCallHooks::new();
    assert!(hooks.is_empty());

    exercise(&hooks);
}
