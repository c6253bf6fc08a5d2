//! Generation-call orchestration: fingerprinting, debouncing, deduplication,
//! cancellation and status broadcasting for streamed report generation.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use scall::{CallRuntime, CallSettings, ReportOrchestrator};
//! use sprovider::{CancellationToken, GenerationRequest, ProviderError, ProviderFuture};
//! use sprovider::{ProviderId, StreamCallbacks, TextProvider};
//!
//! struct Offline;
//!
//! impl TextProvider for Offline {
//!     fn id(&self) -> ProviderId {
//!         ProviderId::Gemini
//!     }
//!
//!     fn is_configured(&self) -> bool {
//!         false
//!     }
//!
//!     fn stream_generate<'a>(
//!         &'a self,
//!         _request: GenerationRequest,
//!         _callbacks: &'a dyn StreamCallbacks,
//!         _cancel: CancellationToken,
//!     ) -> ProviderFuture<'a, Result<String, ProviderError>> {
//!         Box::pin(async { Err(ProviderError::unavailable("offline")) })
//!     }
//!
//!     fn test_connection<'a>(&'a self) -> ProviderFuture<'a, bool> {
//!         Box::pin(async { false })
//!     }
//! }
//!
//! let orchestrator = ReportOrchestrator::builder()
//!     .runtime(CallRuntime::new(CallSettings::default()))
//!     .provider(Offline)
//!     .build()
//!     .expect("orchestrator should build");
//!
//! assert_eq!(orchestrator.provider(), ProviderId::Gemini);
//! assert!(!orchestrator.is_configured());
//! ```

mod debounce;
mod fingerprint;
mod hooks;
mod orchestrator;
mod payload;
mod prompt;
mod registry;
mod runtime;
mod settings;
mod status;
mod types;

pub mod prelude {
    pub use crate::{
        CallKind, CallLifecycleHooks, CallRuntime, CallSettings, CallStatus, ClinicalPayload,
        FindingInstance, Fingerprint, KindSettings, ReportOrchestrator, SelectedFinding,
        StatusSnapshot, Subscription,
    };
    pub use sprovider::{FnStreamCallbacks, ProviderError, ProviderId, StreamCallbacks};
}

pub use debounce::DebounceScheduler;
pub use fingerprint::{Fingerprint, fingerprint};
pub use hooks::{CallLifecycleHooks, NoopCallHooks};
pub use orchestrator::{OrchestratorDebugInfo, ReportOrchestrator, ReportOrchestratorBuilder};
pub use payload::{ClinicalPayload, FindingInstance, SelectedFinding};
pub use prompt::{FindingsPromptBuilder, GenerationPrompt, PromptBuilder};
pub use registry::{
    ActiveCallInfo, Admission, CallHandle, CallOutcome, CallRegistry, RegistrySnapshot,
    SuppressReason,
};
pub use runtime::CallRuntime;
pub use settings::{
    CallSettings, DEFAULT_DEBOUNCE, DEFAULT_DUPLICATE_WINDOW, DEFAULT_HISTORY_RETENTION,
    DEFAULT_MAINTENANCE_INTERVAL, DEFAULT_STALE_AFTER, KindSettings,
};
pub use status::{CallStatus, StatusBroadcaster, StatusSnapshot, Subscription};
pub use types::{CallKey, CallKind};
