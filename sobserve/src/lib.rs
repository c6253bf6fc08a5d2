//! Production-friendly observability hooks for generation call lifecycles.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use scall::{CallRuntime, CallSettings};
//! use sobserve::{CompositeCallHooks, MetricsCallHooks, SafeCallHooks, TracingCallHooks};
//!
//! let hooks = CompositeCallHooks::new()
//!     .with(SafeCallHooks::new(TracingCallHooks))
//!     .with(SafeCallHooks::new(MetricsCallHooks));
//! let _runtime = CallRuntime::with_hooks(CallSettings::default(), Arc::new(hooks));
//! ```

mod composite_hooks;
mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use composite_hooks::CompositeCallHooks;
pub use metrics_hooks::MetricsCallHooks;
pub use safe_hooks::SafeCallHooks;
pub use tracing_hooks::TracingCallHooks;

pub mod prelude {
    pub use crate::{CompositeCallHooks, MetricsCallHooks, SafeCallHooks, TracingCallHooks};
}

#[cfg(test)]
mod tests;
