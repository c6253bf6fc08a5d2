//! Unified facade over the sonoscribe workspace crates.
//!
//! This crate is designed to be the single dependency for report screens.
//! It re-exports the workspace crates, resolves provider configuration from
//! the environment and wires one shared call runtime for every panel.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sonoscribe::prelude::*;
//!
//! # async fn run() -> Result<(), ProviderError> {
//! let runtime = build_runtime_from_env()?;
//! let orchestrator = runtime.orchestrator()?;
//! let _subscription = orchestrator.on_status_change(|status| println!("{:?}", status.state));
//!
//! let payload = ClinicalPayload::new("Abdomen total").with_finding(
//!     ss_finding!("liver", "steatosis", "Hepatic steatosis", severity = "moderate")
//!         .with_instance(ss_instance!("s1", "span" => "17 cm")),
//! );
//! orchestrator.generate_impression(payload, Arc::new(on_text(|text| println!("{text}"))))?;
//! # Ok(())
//! # }
//! ```

mod config;
mod macros;

pub mod prelude;
pub mod providers;
pub mod runtime;
pub mod util;

pub use scall;
pub use scommon;
pub use sobserve;
pub use sprovider;

pub use scall::{
    CallHandle, CallKey, CallKind, CallLifecycleHooks, CallRegistry, CallRuntime, CallSettings,
    CallStatus, ClinicalPayload, DebounceScheduler, FindingInstance, FindingsPromptBuilder,
    Fingerprint, GenerationPrompt, KindSettings, NoopCallHooks, OrchestratorDebugInfo,
    PromptBuilder, ReportOrchestrator, ReportOrchestratorBuilder, SelectedFinding,
    StatusBroadcaster, StatusSnapshot, Subscription, SuppressReason, fingerprint,
};
pub use scommon::{BoxFuture, GenerationOptions};
pub use sobserve::{CompositeCallHooks, MetricsCallHooks, SafeCallHooks, TracingCallHooks};
pub use sprovider::{
    CancellationToken, CumulativeText, FnStreamCallbacks, GenerationRequest,
    InMemoryModelOverrides, ModelOverrides, NoopStreamCallbacks, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, ProviderRegistry, SecretString,
    StreamCallbacks, TextProvider, selected_model_key,
};

pub use config::{
    ConfigError, ConfigErrorKind, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT, ProviderEndpoint,
    ScribeConfig,
};
pub use providers::{build_provider, build_providers, http_client};
pub use runtime::{
    ScribeRuntime, build_runtime, build_runtime_from_env, build_runtime_with,
    build_runtime_with_hooks, default_hooks,
};
pub use util::{is_busy, on_text, parse_provider_id, streaming_callbacks};

#[cfg(test)]
mod tests {
    use crate::{ClinicalPayload, FindingInstance};

    #[test]
    fn ss_measurements_macro_builds_sorted_map() {
        let measurements = crate::ss_measurements! {
            "width" => "3 cm",
            "length" => 11.5,
        };

        assert_eq!(
            measurements.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["length", "width"]
        );
        assert_eq!(measurements["length"], "11.5");
        assert!(crate::ss_measurements!().is_empty());
    }

    #[test]
    fn ss_instance_macro_matches_builder_output() {
        let from_macro = crate::ss_instance!("n1", "size" => "12 mm", "margins" => "smooth");
        let from_builder = FindingInstance::new("n1")
            .with_measurement("size", "12 mm")
            .with_measurement("margins", "smooth");

        assert_eq!(from_macro, from_builder);
        assert!(crate::ss_instance!("bare").measurements.is_empty());
    }

    #[test]
    fn ss_finding_macro_feeds_payloads() {
        let payload = ClinicalPayload::new("Thyroid").with_finding(
            crate::ss_finding!("left-lobe", "nodule", "Solid nodule", severity = "TR4")
                .with_instance(crate::ss_instance!("a", "size" => "9 mm")),
        );

        let finding = &payload.findings[0];
        assert_eq!(finding.severity.as_deref(), Some("TR4"));
        assert_eq!(finding.instances[0].measurements["size"], "9 mm");
        assert!(crate::ss_finding!("liver", "normal", "Normal").severity.is_none());
    }
}
