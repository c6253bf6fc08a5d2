use std::sync::Arc;
use std::time::Duration;

use scall::{CallKey, CallLifecycleHooks, SuppressReason};
use sprovider::ProviderError;

/// Fans every lifecycle event out to each registered hook set, in registration order.
#[derive(Clone, Default)]
pub struct CompositeCallHooks {
    hooks: Vec<Arc<dyn CallLifecycleHooks>>,
}

impl CompositeCallHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<H>(mut self, hooks: H) -> Self
    where
        H: CallLifecycleHooks + 'static,
    {
        self.hooks.push(Arc::new(hooks));
        self
    }

    pub fn with_shared(mut self, hooks: Arc<dyn CallLifecycleHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl std::fmt::Debug for CompositeCallHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeCallHooks")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl CallLifecycleHooks for CompositeCallHooks {
    fn on_call_scheduled(&self, call: &CallKey, delay: Duration) {
        for hooks in &self.hooks {
            hooks.on_call_scheduled(call, delay);
        }
    }

    fn on_call_superseded(&self, superseded: &CallKey, replacement: &CallKey) {
        for hooks in &self.hooks {
            hooks.on_call_superseded(superseded, replacement);
        }
    }

    fn on_call_suppressed(&self, call: &CallKey, reason: SuppressReason) {
        for hooks in &self.hooks {
            hooks.on_call_suppressed(call, reason);
        }
    }

    fn on_call_started(&self, call: &CallKey) {
        for hooks in &self.hooks {
            hooks.on_call_started(call);
        }
    }

    fn on_call_completed(&self, call: &CallKey, elapsed: Duration, chars: usize) {
        for hooks in &self.hooks {
            hooks.on_call_completed(call, elapsed, chars);
        }
    }

    fn on_call_failed(&self, call: &CallKey, error: &ProviderError, elapsed: Duration) {
        for hooks in &self.hooks {
            hooks.on_call_failed(call, error, elapsed);
        }
    }

    fn on_call_cancelled(&self, call: &CallKey, elapsed: Duration) {
        for hooks in &self.hooks {
            hooks.on_call_cancelled(call, elapsed);
        }
    }

    fn on_stale_purged(&self, call: &CallKey, age: Duration) {
        for hooks in &self.hooks {
            hooks.on_stale_purged(call, age);
        }
    }
}
