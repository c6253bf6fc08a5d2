//! Provider construction from resolved configuration.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sprovider::{ModelOverrides, ProviderError, ProviderRegistry, TextProvider};

use crate::{ProviderEndpoint, ScribeConfig};

pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))
}

/// Builds one provider per configured endpoint, all sharing one HTTP client and override store.
pub fn build_providers(
    config: &ScribeConfig,
    overrides: Arc<dyn ModelOverrides>,
) -> Result<ProviderRegistry, ProviderError> {
    let http = http_client(config.http_timeout)?;
    let mut registry = ProviderRegistry::new();
    for endpoint in &config.endpoints {
        registry.register_shared(build_provider(endpoint, http.clone(), Arc::clone(&overrides))?);
    }
    Ok(registry)
}

#[cfg(feature = "provider-proxy")]
pub fn build_provider(
    endpoint: &ProviderEndpoint,
    http: Client,
    overrides: Arc<dyn ModelOverrides>,
) -> Result<Arc<dyn TextProvider>, ProviderError> {
    use sprovider::adapters::proxy::{ProxyProvider, ReqwestProxyTransport};

    let mut transport = ReqwestProxyTransport::new(http, endpoint.url.clone());
    if let Some(api_key) = &endpoint.api_key {
        transport = transport.with_api_key(api_key.clone());
    }

    let mut provider = ProxyProvider::new(endpoint.provider_id, Arc::new(transport))
        .with_default_model(endpoint.model.clone())
        .with_model_overrides(overrides);
    if let Some(field) = &endpoint.structured_field {
        provider = provider.with_structured_field(field.clone());
    }

    tracing::debug!(
        phase = "provider",
        event = "built",
        provider = %endpoint.provider_id,
        endpoint = %endpoint.url,
        model = %endpoint.model,
        structured = endpoint.structured_field.is_some()
    );
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "provider-proxy"))]
pub fn build_provider(
    _endpoint: &ProviderEndpoint,
    _http: Client,
    _overrides: Arc<dyn ModelOverrides>,
) -> Result<Arc<dyn TextProvider>, ProviderError> {
    Err(ProviderError::configuration(
        "provider-proxy feature is not enabled on sonoscribe",
    ))
}
