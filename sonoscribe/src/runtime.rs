//! Runtime wiring: one shared call runtime, many orchestrators.

use std::sync::Arc;

use scall::{CallLifecycleHooks, CallRuntime, ReportOrchestrator};
use sobserve::{CompositeCallHooks, MetricsCallHooks, SafeCallHooks, TracingCallHooks};
use sprovider::{
    InMemoryModelOverrides, ModelOverrides, ProviderError, ProviderId, ProviderRegistry,
    selected_model_key,
};

use crate::{ScribeConfig, build_providers};

/// Tracing and metrics hooks, each isolated from panics.
pub fn default_hooks() -> Arc<dyn CallLifecycleHooks> {
    Arc::new(
        CompositeCallHooks::new()
            .with(SafeCallHooks::new(TracingCallHooks))
            .with(SafeCallHooks::new(MetricsCallHooks)),
    )
}

/// Everything an application shares between its report panels.
#[derive(Clone)]
pub struct ScribeRuntime {
    pub config: ScribeConfig,
    pub calls: CallRuntime,
    pub providers: ProviderRegistry,
    pub overrides: Arc<dyn ModelOverrides>,
}

impl std::fmt::Debug for ScribeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScribeRuntime")
            .field("config", &self.config)
            .field("calls", &self.calls)
            .field("providers", &self.providers.len())
            .finish_non_exhaustive()
    }
}

impl ScribeRuntime {
    /// Creates an orchestrator for one panel. Panels share call state and the
    /// active provider; each has its own debounce slots.
    pub fn orchestrator(&self) -> Result<ReportOrchestrator, ProviderError> {
        ReportOrchestrator::builder()
            .runtime(self.calls.clone())
            .providers(self.providers.clone())
            .default_provider(self.config.default_provider)
            .build()
    }

    /// Records the model the user picked for `provider_id`; the next call uses it.
    pub fn select_model(&self, provider_id: ProviderId, model: &str) {
        self.overrides.set(&selected_model_key(provider_id), model);
    }

    pub fn clear_model_selection(&self, provider_id: ProviderId) {
        self.overrides.clear(&selected_model_key(provider_id));
    }

    /// Cancels every call, forgets history and drops status subscribers.
    pub fn cleanup(&self) {
        self.calls.cleanup();
    }
}

pub fn build_runtime(config: ScribeConfig) -> Result<ScribeRuntime, ProviderError> {
    build_runtime_with(config, default_hooks(), Arc::new(InMemoryModelOverrides::new()))
}

pub fn build_runtime_with_hooks(
    config: ScribeConfig,
    hooks: Arc<dyn CallLifecycleHooks>,
) -> Result<ScribeRuntime, ProviderError> {
    build_runtime_with(config, hooks, Arc::new(InMemoryModelOverrides::new()))
}

pub fn build_runtime_with(
    config: ScribeConfig,
    hooks: Arc<dyn CallLifecycleHooks>,
    overrides: Arc<dyn ModelOverrides>,
) -> Result<ScribeRuntime, ProviderError> {
    let providers = build_providers(&config, Arc::clone(&overrides))?;
    let calls = CallRuntime::with_hooks(config.call_settings(), hooks);
    calls.select_provider(config.default_provider);

    Ok(ScribeRuntime {
        config,
        calls,
        providers,
        overrides,
    })
}

/// Resolves configuration from the process environment and wires the runtime.
pub fn build_runtime_from_env() -> Result<ScribeRuntime, ProviderError> {
    let config = ScribeConfig::from_env()
        .map_err(|err| ProviderError::configuration(err.to_string()))?;
    build_runtime(config)
}

#[cfg(all(test, feature = "provider-proxy"))]
mod tests {
    use std::time::Duration;

    use scall::CallStatus;
    use sprovider::SELECTED_MODEL_KEY;

    use super::*;

    #[test]
    fn panels_share_call_state_and_the_active_provider() {
        let config = ScribeConfig {
            default_provider: ProviderId::Claude,
            debounce: Duration::from_millis(250),
            ..ScribeConfig::default()
        };
        let runtime = build_runtime(config).expect("runtime should build");

        let left = runtime.orchestrator().expect("left panel");
        let right = runtime.orchestrator().expect("right panel");
        assert_eq!(left.provider(), ProviderId::Claude);
        assert_eq!(runtime.calls.settings().debounce, Duration::from_millis(250));

        right
            .set_provider(ProviderId::OpenAi)
            .expect("openai is registered");
        assert_eq!(left.provider(), ProviderId::OpenAi);
        assert_eq!(left.status().current_provider, left.provider());
        assert!(left.is_configured());

        let late = runtime.orchestrator().expect("panel opened after the switch");
        assert_eq!(late.provider(), ProviderId::OpenAi);
    }

    #[test]
    fn model_selection_is_scoped_to_one_provider() {
        let runtime = build_runtime(ScribeConfig::default()).expect("runtime should build");

        runtime.select_model(ProviderId::Gemini, "gemini-2.0-flash");
        assert_eq!(
            runtime.overrides.get(&selected_model_key(ProviderId::Gemini)).as_deref(),
            Some("gemini-2.0-flash")
        );
        assert_eq!(runtime.overrides.get(SELECTED_MODEL_KEY), None);
        assert_eq!(
            runtime.overrides.get(&selected_model_key(ProviderId::Claude)),
            None
        );

        runtime.clear_model_selection(ProviderId::Gemini);
        assert_eq!(
            runtime.overrides.get(&selected_model_key(ProviderId::Gemini)),
            None
        );
    }

    #[test]
    fn cleanup_resets_shared_status() {
        let runtime = build_runtime(ScribeConfig::default()).expect("runtime should build");
        let _subscription = runtime.calls.status().subscribe(|_| {});
        runtime.calls.status().call_failed("offline", 0);

        runtime.cleanup();

        assert_eq!(runtime.calls.status().snapshot().state, CallStatus::Idle);
        assert_eq!(runtime.calls.status().subscriber_count(), 0);
    }
}
