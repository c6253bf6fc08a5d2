use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::{GenerationRequest, ProviderError, ProviderId, StreamCallbacks};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Capability surface every text-generation backend implements.
pub trait TextProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn is_configured(&self) -> bool;

    /// Streams one generation into `callbacks` and resolves to the final text.
    ///
    /// Adapters stop reading as soon as `cancel` fires and report nothing
    /// further for that call.
    fn stream_generate<'a>(
        &'a self,
        request: GenerationRequest,
        callbacks: &'a dyn StreamCallbacks,
        cancel: CancellationToken,
    ) -> ProviderFuture<'a, Result<String, ProviderError>>;

    /// Lightweight liveness probe; failures map to `false`.
    fn test_connection<'a>(&'a self) -> ProviderFuture<'a, bool>;
}
