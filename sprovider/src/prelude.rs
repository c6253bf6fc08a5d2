//! Common `sprovider` imports for downstream crates.

pub use crate::{
    CancellationToken, CumulativeText, FnStreamCallbacks, GenerationRequest, ModelOverrides,
    NoopStreamCallbacks, ProviderError, ProviderErrorKind, ProviderFuture, ProviderId,
    ProviderRegistry, StreamCallbacks, TextProvider,
};
#[cfg(feature = "provider-proxy")]
pub use crate::adapters::proxy::{ProxyProvider, ReqwestProxyTransport};
pub use scommon::{BoxFuture, GenerationOptions};
