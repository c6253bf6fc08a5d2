//! Shared call state for every orchestrator in a process.
//!
//! ```rust
//! use scall::{CallRuntime, CallSettings, CallStatus};
//!
//! let runtime = CallRuntime::new(CallSettings::default());
//! let _subscription = runtime.status().subscribe(|_| {});
//!
//! runtime.cleanup();
//! assert_eq!(runtime.status().subscriber_count(), 0);
//! assert_eq!(runtime.status().snapshot().state, CallStatus::Idle);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use sprovider::ProviderId;
use tokio::task::JoinHandle;

use crate::{CallLifecycleHooks, CallRegistry, CallSettings, NoopCallHooks, StatusBroadcaster};

/// Registry, history, status broadcaster and active provider shared by
/// cloned handles.
#[derive(Clone)]
pub struct CallRuntime {
    settings: Arc<CallSettings>,
    registry: Arc<CallRegistry>,
    status: StatusBroadcaster,
    provider: Arc<Mutex<Option<ProviderId>>>,
    hooks: Arc<dyn CallLifecycleHooks>,
}

impl std::fmt::Debug for CallRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallRuntime")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("status", &self.status)
            .field("provider", &self.provider())
            .finish_non_exhaustive()
    }
}

impl Default for CallRuntime {
    fn default() -> Self {
        Self::new(CallSettings::default())
    }
}

impl CallRuntime {
    pub fn new(settings: CallSettings) -> Self {
        Self::with_hooks(settings, Arc::new(NoopCallHooks))
    }

    pub fn with_hooks(settings: CallSettings, hooks: Arc<dyn CallLifecycleHooks>) -> Self {
        let registry = CallRegistry::from_settings(&settings).with_hooks(Arc::clone(&hooks));
        Self {
            settings: Arc::new(settings),
            registry: Arc::new(registry),
            status: StatusBroadcaster::new(),
            provider: Arc::new(Mutex::new(None)),
            hooks,
        }
    }

    pub fn settings(&self) -> &CallSettings {
        &self.settings
    }

    pub fn registry(&self) -> &CallRegistry {
        &self.registry
    }

    pub fn status(&self) -> &StatusBroadcaster {
        &self.status
    }

    pub fn hooks(&self) -> &dyn CallLifecycleHooks {
        self.hooks.as_ref()
    }

    /// The active provider, once one has been selected.
    pub fn provider(&self) -> Option<ProviderId> {
        *self.selected_provider()
    }

    /// Makes `provider_id` active for every orchestrator and in the status snapshot.
    pub fn select_provider(&self, provider_id: ProviderId) {
        *self.selected_provider() = Some(provider_id);
        self.status.set_provider(provider_id);
        tracing::debug!(phase = "runtime", event = "provider_selected", provider = %provider_id);
    }

    /// Selects `provider_id` unless a provider is already active, and returns
    /// the active one.
    pub(crate) fn adopt_provider(&self, provider_id: ProviderId) -> ProviderId {
        let adopted = {
            let mut selected = self.selected_provider();
            if let Some(active) = *selected {
                return active;
            }
            *selected = Some(provider_id);
            provider_id
        };
        self.status.set_provider(adopted);
        adopted
    }

    /// Cancels every active call, forgets history and drops all status subscribers.
    pub fn cleanup(&self) {
        let cancelled = self.registry.cancel_all();
        self.registry.clear_history();
        self.status.reset_idle();
        self.status.clear_subscribers();
        tracing::debug!(phase = "runtime", event = "cleanup", cancelled);
    }

    fn selected_provider(&self) -> MutexGuard<'_, Option<ProviderId>> {
        self.provider
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Periodically purges stale calls and prunes history.
    ///
    /// The task ends on its own once every runtime handle is dropped; abort the
    /// returned handle to stop it earlier.
    pub fn spawn_maintenance(&self, interval: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(&self.registry);
        let status = self.status.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };

                let purged = registry.purge_stale();
                let pruned = registry.prune_history();
                if purged > 0 {
                    status.call_cancelled(registry.active_count());
                }
                tracing::debug!(
                    phase = "runtime",
                    event = "maintenance",
                    purged,
                    pruned
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Admission, CallKey, CallKind, CallStatus, Fingerprint};

    #[tokio::test(start_paused = true)]
    async fn maintenance_purges_stale_calls_and_old_history() {
        let runtime = CallRuntime::new(
            CallSettings::default()
                .with_stale_after(Duration::from_secs(30))
                .with_history_retention(Duration::from_secs(45)),
        );
        let registry = runtime.registry();

        let done = CallKey::new(Fingerprint::from("done"), CallKind::FullReport, ProviderId::Gemini);
        let Admission::Accepted(handle) = registry.admit(done) else {
            panic!("expected admission");
        };
        assert!(registry.complete(&handle, "text"));

        let stuck = CallKey::new(Fingerprint::from("stuck"), CallKind::Impression, ProviderId::Gemini);
        let Admission::Accepted(stuck) = registry.admit(stuck) else {
            panic!("expected admission");
        };
        runtime.status().call_accepted(1);

        let task = runtime.spawn_maintenance(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(stuck.is_cancelled());
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.history_len(), 0);
        assert_eq!(runtime.status().snapshot().state, CallStatus::Idle);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_cancels_everything_shared_by_clones() {
        let runtime = CallRuntime::default();
        let panel = runtime.clone();

        let key = CallKey::new(Fingerprint::from("f"), CallKind::Impression, ProviderId::Claude);
        let Admission::Accepted(handle) = panel.registry().admit(key) else {
            panic!("expected admission");
        };
        panel.status().call_accepted(1);
        let _subscription = panel.status().subscribe(|_| {});

        runtime.cleanup();

        assert!(handle.is_cancelled());
        assert!(!panel.registry().has_active_calls());
        assert_eq!(panel.status().subscriber_count(), 0);
        assert_eq!(panel.status().snapshot().state, CallStatus::Idle);
    }

    #[test]
    fn the_first_adopted_provider_stays_active_for_later_panels() {
        let runtime = CallRuntime::default();
        assert_eq!(runtime.provider(), None);

        assert_eq!(runtime.adopt_provider(ProviderId::Claude), ProviderId::Claude);
        assert_eq!(runtime.adopt_provider(ProviderId::Gemini), ProviderId::Claude);
        assert_eq!(runtime.status().snapshot().current_provider, ProviderId::Claude);

        runtime.select_provider(ProviderId::OpenAi);
        assert_eq!(runtime.clone().provider(), Some(ProviderId::OpenAi));
        assert_eq!(runtime.status().snapshot().current_provider, ProviderId::OpenAi);
    }
}
