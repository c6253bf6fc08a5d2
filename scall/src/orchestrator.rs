//! Report orchestrator: the single entry point UI surfaces call.
//!
//! Each `generate_*` call is fingerprinted, debounced per call kind, checked
//! against the shared registry and streamed through the active provider.
//! Chunks, completion and errors are relayed to the caller's callbacks and to
//! the shared status broadcaster, and nothing is relayed after a call has
//! been cancelled. A call purged as stale is reported as a timeout.
//!
//! Orchestrators built on one [`CallRuntime`] share its active provider, so
//! every panel and the status snapshot agree on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use sprovider::{
    GenerationRequest, ProviderError, ProviderId, ProviderRegistry, StreamCallbacks, TextProvider,
};

use crate::{
    Admission, CallHandle, CallKey, CallKind, CallOutcome, CallRuntime, ClinicalPayload,
    DebounceScheduler, Fingerprint, FindingsPromptBuilder, PromptBuilder, RegistrySnapshot,
    StatusSnapshot, Subscription, fingerprint,
};

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorDebugInfo {
    pub provider: ProviderId,
    pub registry: RegistrySnapshot,
    /// Calls still waiting out their debounce window.
    pub pending: Vec<CallKey>,
    pub status: StatusSnapshot,
}

struct OrchestratorInner {
    runtime: CallRuntime,
    providers: ProviderRegistry,
    fallback_provider: ProviderId,
    prompts: Arc<dyn PromptBuilder>,
    debounce: DebounceScheduler<CallKind>,
    pending: Mutex<HashMap<CallKind, CallKey>>,
    own_calls: Mutex<HashMap<CallKind, CallHandle>>,
}

/// Cheaply cloneable; clones share pending debounces and the calls this
/// orchestrator owns.
#[derive(Clone)]
pub struct ReportOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl std::fmt::Debug for ReportOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportOrchestrator")
            .field("provider", &self.provider())
            .field("runtime", &self.inner.runtime)
            .finish_non_exhaustive()
    }
}

impl ReportOrchestrator {
    pub fn builder() -> ReportOrchestratorBuilder {
        ReportOrchestratorBuilder::default()
    }

    pub fn generate_impression(
        &self,
        payload: ClinicalPayload,
        callbacks: Arc<dyn StreamCallbacks>,
    ) -> Result<Fingerprint, ProviderError> {
        self.generate(CallKind::Impression, payload, callbacks)
    }

    pub fn generate_full_report(
        &self,
        payload: ClinicalPayload,
        callbacks: Arc<dyn StreamCallbacks>,
    ) -> Result<Fingerprint, ProviderError> {
        self.generate(CallKind::FullReport, payload, callbacks)
    }

    /// Schedules a call and returns its fingerprint.
    ///
    /// An unconfigured active provider fails immediately: `on_error` is
    /// invoked, the status moves to `Error` and the registry is not touched.
    /// Must be called from within a tokio runtime.
    pub fn generate(
        &self,
        kind: CallKind,
        payload: ClinicalPayload,
        callbacks: Arc<dyn StreamCallbacks>,
    ) -> Result<Fingerprint, ProviderError> {
        let runtime = &self.inner.runtime;
        let provider_id = self.provider();
        let Some(provider) = self
            .inner
            .providers
            .get(provider_id)
            .filter(|provider| provider.is_configured())
        else {
            let error = ProviderError::configuration(format!(
                "provider '{provider_id}' is not configured"
            ));
            callbacks.on_error(&error);
            runtime
                .status()
                .call_failed(error.message.clone(), runtime.registry().active_count());
            return Err(error);
        };

        let key = CallKey::new(fingerprint(kind, provider_id, &payload), kind, provider_id);
        let request = self.build_request(kind, &payload);
        let delay = runtime.settings().debounce;

        runtime.hooks().on_call_scheduled(&key, delay);
        let previous = self.inner.pending().insert(kind, key.clone());

        let inner = Arc::clone(&self.inner);
        let dispatch_key = key.clone();
        let superseded = self.inner.debounce.schedule(kind, delay, move || async move {
            inner
                .dispatch(dispatch_key, provider, request, callbacks)
                .await;
        });

        if superseded && let Some(previous) = previous {
            runtime.hooks().on_call_superseded(&previous, &key);
        }
        Ok(key.fingerprint)
    }

    /// Switches the active provider for every orchestrator on the runtime.
    pub fn set_provider(&self, provider_id: ProviderId) -> Result<(), ProviderError> {
        if !self.inner.providers.contains(provider_id) {
            return Err(ProviderError::configuration(format!(
                "provider '{provider_id}' is not registered"
            )));
        }

        self.inner.runtime.select_provider(provider_id);
        Ok(())
    }

    pub fn provider(&self) -> ProviderId {
        self.inner
            .runtime
            .provider()
            .unwrap_or(self.inner.fallback_provider)
    }

    /// Drops pending debounces and cancels every active call in the shared registry.
    pub fn cancel_all(&self) -> usize {
        self.inner.debounce.cancel_all();
        self.inner.pending().clear();
        self.inner.own_calls().clear();

        let registry = self.inner.runtime.registry();
        let cancelled = registry.cancel_all();
        self.inner
            .runtime
            .status()
            .call_cancelled(registry.active_count());
        cancelled
    }

    pub fn cancel_impression(&self) -> usize {
        self.cancel_kind(CallKind::Impression)
    }

    pub fn cancel_report(&self) -> usize {
        self.cancel_kind(CallKind::FullReport)
    }

    /// Drops the pending debounce for `kind` and cancels active calls of that
    /// kind, leaving other kinds running.
    pub fn cancel_kind(&self, kind: CallKind) -> usize {
        self.inner.debounce.cancel(&kind);
        self.inner.pending().remove(&kind);
        self.inner.own_calls().remove(&kind);

        let registry = self.inner.runtime.registry();
        let cancelled = registry.cancel_by_kind(kind);
        self.inner
            .runtime
            .status()
            .call_cancelled(registry.active_count());
        cancelled
    }

    pub fn on_status_change<F>(&self, subscriber: F) -> Subscription
    where
        F: Fn(&StatusSnapshot) + Send + Sync + 'static,
    {
        self.inner.runtime.status().subscribe(subscriber)
    }

    pub fn status(&self) -> StatusSnapshot {
        self.inner.runtime.status().snapshot()
    }

    pub fn is_configured(&self) -> bool {
        self.inner
            .providers
            .get(self.provider())
            .is_some_and(|provider| provider.is_configured())
    }

    pub async fn test_connection(&self) -> bool {
        match self.inner.providers.get(self.provider()) {
            Some(provider) => provider.test_connection().await,
            None => false,
        }
    }

    pub fn active_call_count(&self) -> usize {
        self.inner.runtime.registry().active_count()
    }

    pub fn active_calls_of_kind(&self, kind: CallKind) -> usize {
        self.inner.runtime.registry().active_calls_of_kind(kind)
    }

    pub fn has_active_calls(&self) -> bool {
        self.inner.runtime.registry().has_active_calls()
    }

    pub fn debug_info(&self) -> OrchestratorDebugInfo {
        let mut pending = self.inner.pending().values().cloned().collect::<Vec<_>>();
        pending.sort_by_key(|key| key.kind);

        OrchestratorDebugInfo {
            provider: self.provider(),
            registry: self.inner.runtime.registry().snapshot(),
            pending,
            status: self.status(),
        }
    }

    pub fn runtime(&self) -> &CallRuntime {
        &self.inner.runtime
    }

    /// Drops pending work and tears down the shared runtime (see [`CallRuntime::cleanup`]).
    pub fn cleanup(&self) {
        self.inner.debounce.cancel_all();
        self.inner.pending().clear();
        self.inner.own_calls().clear();
        self.inner.runtime.cleanup();
    }

    fn build_request(&self, kind: CallKind, payload: &ClinicalPayload) -> GenerationRequest {
        let prompt = self.inner.prompts.build(kind, payload);
        let settings = self.inner.runtime.settings().kind(kind);

        let mut request = GenerationRequest::new(prompt.prompt, "")
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens);
        request.system_instruction = prompt.system_instruction;
        request
    }
}

impl OrchestratorInner {
    fn pending(&self) -> MutexGuard<'_, HashMap<CallKind, CallKey>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn own_calls(&self) -> MutexGuard<'_, HashMap<CallKind, CallHandle>> {
        self.own_calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn dispatch(
        &self,
        key: CallKey,
        provider: Arc<dyn TextProvider>,
        request: GenerationRequest,
        callbacks: Arc<dyn StreamCallbacks>,
    ) {
        {
            let mut pending = self.pending();
            if pending.get(&key.kind) == Some(&key) {
                pending.remove(&key.kind);
            }
        }

        let registry = self.runtime.registry();
        let status = self.runtime.status();
        let replaced_own_call = self.cancel_own_call_if_changed(&key);

        let handle = match registry.admit(key.clone()) {
            Admission::Accepted(handle) => handle,
            Admission::Suppressed(_) => {
                if replaced_own_call {
                    status.call_cancelled(registry.active_count());
                }
                return;
            }
        };
        self.own_calls().insert(key.kind, handle.clone());
        status.call_accepted(registry.active_count());

        let relay = ChunkRelay {
            handle: handle.clone(),
            callbacks: Arc::clone(&callbacks),
            runtime: self.runtime.clone(),
        };
        let timeout = self.runtime.settings().kind(key.kind).timeout;
        let (result, timed_out) = match tokio::time::timeout(
            timeout,
            provider.stream_generate(request, &relay, handle.token().clone()),
        )
        .await
        {
            Ok(result) => (result, false),
            Err(_) => (
                Err(ProviderError::timeout(format!(
                    "{} call to '{}' exceeded {}s",
                    key.kind,
                    key.provider,
                    timeout.as_secs()
                ))),
                true,
            ),
        };

        self.release_own_call(&handle);
        match registry.settle(&handle, result) {
            CallOutcome::Completed(text) => {
                callbacks.on_complete(&text);
                status.call_completed(registry.active_count());
            }
            CallOutcome::Failed(error) => {
                callbacks.on_error(&error);
                status.call_failed(error.message.clone(), registry.active_count());
            }
            CallOutcome::Expired => {
                let error = ProviderError::timeout(format!(
                    "{} call to '{}' was abandoned after {}s",
                    key.kind,
                    key.provider,
                    self.runtime.settings().stale_after.as_secs()
                ));
                callbacks.on_error(&error);
                status.call_failed(error.message.clone(), registry.active_count());
            }
            CallOutcome::Cancelled | CallOutcome::Suppressed(_) => {}
        }

        if timed_out {
            handle.token().cancel();
        }
    }

    /// Cancels this orchestrator's running call of the same kind when its
    /// fingerprint differs from `key`. An identical running call is kept.
    fn cancel_own_call_if_changed(&self, key: &CallKey) -> bool {
        let previous = {
            let mut own_calls = self.own_calls();
            match own_calls.get(&key.kind) {
                Some(handle) if handle.key().fingerprint != key.fingerprint => {
                    own_calls.remove(&key.kind)
                }
                _ => None,
            }
        };

        previous.is_some_and(|handle| self.runtime.registry().cancel_call(&handle))
    }

    fn release_own_call(&self, handle: &CallHandle) {
        let mut own_calls = self.own_calls();
        if own_calls
            .get(&handle.key().kind)
            .is_some_and(|owned| owned.id() == handle.id())
        {
            own_calls.remove(&handle.key().kind);
        }
    }
}

/// Relays provider chunks for one call through its delivery gate.
///
/// Terminal events are taken from the provider's returned result instead of
/// its `on_complete`/`on_error` so each call settles exactly once.
struct ChunkRelay {
    handle: CallHandle,
    callbacks: Arc<dyn StreamCallbacks>,
    runtime: CallRuntime,
}

impl StreamCallbacks for ChunkRelay {
    fn on_chunk(&self, text: &str) {
        self.handle.deliver(|| {
            self.runtime
                .status()
                .chunk_received(self.runtime.registry().active_count());
            self.callbacks.on_chunk(text);
        });
    }
}

#[derive(Default)]
pub struct ReportOrchestratorBuilder {
    runtime: Option<CallRuntime>,
    providers: ProviderRegistry,
    default_provider: Option<ProviderId>,
    prompts: Option<Arc<dyn PromptBuilder>>,
}

impl ReportOrchestratorBuilder {
    /// Shares `runtime` (registry, history, status) with other orchestrators.
    pub fn runtime(mut self, runtime: CallRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn provider<P>(mut self, provider: P) -> Self
    where
        P: TextProvider + 'static,
    {
        self.providers.register(provider);
        self
    }

    pub fn shared_provider(mut self, provider: Arc<dyn TextProvider>) -> Self {
        self.providers.register_shared(provider);
        self
    }

    pub fn providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    pub fn default_provider(mut self, provider_id: ProviderId) -> Self {
        self.default_provider = Some(provider_id);
        self
    }

    pub fn prompt_builder<B>(mut self, prompts: B) -> Self
    where
        B: PromptBuilder + 'static,
    {
        self.prompts = Some(Arc::new(prompts));
        self
    }

    /// Fails when no provider is registered or the default provider is unknown.
    /// Without an explicit default, the first configured provider is used.
    /// A runtime that already has an active provider keeps it.
    pub fn build(self) -> Result<ReportOrchestrator, ProviderError> {
        let provider_id = match self.default_provider {
            Some(provider_id) if self.providers.contains(provider_id) => provider_id,
            Some(provider_id) => {
                return Err(ProviderError::configuration(format!(
                    "default provider '{provider_id}' is not registered"
                )));
            }
            None => ProviderId::ALL
                .into_iter()
                .find(|id| self.providers.configured().contains(id))
                .or_else(|| {
                    ProviderId::ALL
                        .into_iter()
                        .find(|id| self.providers.contains(*id))
                })
                .ok_or_else(|| ProviderError::configuration("no providers registered"))?,
        };

        let runtime = self.runtime.unwrap_or_default();
        runtime.adopt_provider(provider_id);

        Ok(ReportOrchestrator {
            inner: Arc::new(OrchestratorInner {
                runtime,
                providers: self.providers,
                fallback_provider: provider_id,
                prompts: self
                    .prompts
                    .unwrap_or_else(|| Arc::new(FindingsPromptBuilder::new())),
                debounce: DebounceScheduler::new(),
                pending: Mutex::new(HashMap::new()),
                own_calls: Mutex::new(HashMap::new()),
            }),
        })
    }
}
