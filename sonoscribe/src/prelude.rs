//! Common imports for most sonoscribe applications.

pub use crate::{
    ScribeConfig, ScribeRuntime, build_runtime, build_runtime_from_env, build_runtime_with,
    build_runtime_with_hooks, default_hooks, is_busy, on_text, parse_provider_id,
    streaming_callbacks,
};
pub use crate::{ss_finding, ss_instance, ss_measurements};
pub use crate::{
    CallKind, CallStatus, ClinicalPayload, ConfigError, ConfigErrorKind, FindingInstance,
    Fingerprint, FnStreamCallbacks, ProviderError, ProviderErrorKind, ProviderId,
    ReportOrchestrator, SelectedFinding, StatusSnapshot, StreamCallbacks, Subscription,
};
