//! Provider abstraction for streamed report generation.
//!
//! A [`TextProvider`] takes one [`GenerationRequest`], reports cumulative text
//! through [`StreamCallbacks`] and resolves to the final text. Adapters stop
//! emitting as soon as the call's cancellation token fires.
//!
//! ```rust
//! use sprovider::{GenerationRequest, ProviderId};
//!
//! let request = GenerationRequest::builder("Summarise the findings")
//!     .temperature(0.2)
//!     .max_tokens(2048)
//!     .build()
//!     .expect("request should be valid");
//!
//! assert!(request.model.is_empty());
//! assert_eq!("claude".parse::<ProviderId>().expect("known id"), ProviderId::Claude);
//! ```

mod callbacks;
mod credentials;
mod error;
mod model;
mod overrides;
mod provider;
mod registry;

pub mod adapters;
pub mod prelude;

pub use callbacks::{CumulativeText, FnStreamCallbacks, NoopStreamCallbacks, StreamCallbacks};
pub use credentials::SecretString;
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{GenerationRequest, GenerationRequestBuilder, ProviderId};
pub use overrides::{
    InMemoryModelOverrides, ModelOverrides, SELECTED_MODEL_KEY, selected_model_key,
};
pub use provider::{ProviderFuture, TextProvider};
pub use registry::ProviderRegistry;
pub use scommon::{BoxFuture, GenerationOptions};
pub use tokio_util::sync::CancellationToken;
