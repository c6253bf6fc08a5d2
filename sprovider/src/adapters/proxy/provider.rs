//! `TextProvider` implementation over a chat-style streaming proxy.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{
    CumulativeText, GenerationRequest, ModelOverrides, ProviderError, ProviderFuture, ProviderId,
    StreamCallbacks, TextProvider, selected_model_key,
};

use super::decode::StreamDecoder;
use super::structured::StructuredFieldDecoder;
use super::transport::ProxyTransport;
use super::types::ProxyRequest;

const CONNECTION_PROBE_PROMPT: &str = "Reply only: OK";
const CONNECTION_PROBE_MAX_TOKENS: u32 = 10;

#[derive(Clone)]
pub struct ProxyProvider {
    id: ProviderId,
    transport: Arc<dyn ProxyTransport>,
    default_model: String,
    overrides: Option<Arc<dyn ModelOverrides>>,
    structured_field: Option<String>,
}

impl ProxyProvider {
    pub fn new(id: ProviderId, transport: Arc<dyn ProxyTransport>) -> Self {
        Self {
            id,
            transport,
            default_model: id.default_model().to_string(),
            overrides: None,
            structured_field: None,
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_model_overrides(mut self, overrides: Arc<dyn ModelOverrides>) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Requests JSON output and streams only the named string field.
    pub fn with_structured_field(mut self, field: impl Into<String>) -> Self {
        self.structured_field = Some(field.into());
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Explicit request model, then the session override, then the default.
    pub(crate) fn resolve_model(&self, requested: &str) -> String {
        if !requested.trim().is_empty() {
            return requested.to_string();
        }

        self.overrides
            .as_ref()
            .and_then(|overrides| overrides.get(&selected_model_key(self.id)))
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| self.default_model.clone())
    }

    pub(crate) fn build_proxy_request(&self, request: GenerationRequest) -> ProxyRequest {
        ProxyRequest {
            model: self.resolve_model(&request.model),
            system_instruction: request.system_instruction,
            prompt: request.prompt,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream: request.options.stream,
            json_response: self.structured_field.is_some(),
        }
    }

    async fn run_stream(
        &self,
        request: GenerationRequest,
        callbacks: &dyn StreamCallbacks,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::configuration(format!(
                "{} proxy endpoint is not configured",
                self.id
            )));
        }
        request.validate()?;

        let proxy_request = self.build_proxy_request(request);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            response = self.transport.open_stream(proxy_request) => response?,
        };

        let mut decoder = StreamDecoder::new(response.format);
        let mut structured = self
            .structured_field
            .as_ref()
            .map(|field| StructuredFieldDecoder::new(field.as_str()));
        let mut text = CumulativeText::new();
        let mut body = response.body;

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                item = body.next() => item,
            };
            let Some(bytes) = item else {
                break;
            };

            let fragments = decoder.push(&bytes?);
            emit(fragments, &mut text, structured.as_mut(), callbacks, cancel)?;
        }
        emit(decoder.finish(), &mut text, structured.as_mut(), callbacks, cancel)?;

        let final_text = match structured {
            Some(decoder) => decoder.finish()?,
            None => text.into_string(),
        };
        Ok(final_text.trim_end().to_string())
    }
}

impl std::fmt::Debug for ProxyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyProvider")
            .field("id", &self.id)
            .field("transport", &self.transport)
            .field("default_model", &self.default_model)
            .field("structured_field", &self.structured_field)
            .finish_non_exhaustive()
    }
}

impl TextProvider for ProxyProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn is_configured(&self) -> bool {
        self.transport.is_configured() && !self.default_model.trim().is_empty()
    }

    fn stream_generate<'a>(
        &'a self,
        request: GenerationRequest,
        callbacks: &'a dyn StreamCallbacks,
        cancel: CancellationToken,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let result = self.run_stream(request, callbacks, &cancel).await;
            if cancel.is_cancelled() {
                return Err(cancelled());
            }

            match &result {
                Ok(text) => callbacks.on_complete(text),
                Err(error) => callbacks.on_error(error),
            }
            result
        })
    }

    fn test_connection<'a>(&'a self) -> ProviderFuture<'a, bool> {
        Box::pin(async move {
            if !self.is_configured() {
                return false;
            }

            let probe = ProxyRequest {
                model: self.resolve_model(""),
                system_instruction: None,
                prompt: CONNECTION_PROBE_PROMPT.to_string(),
                temperature: None,
                max_tokens: Some(CONNECTION_PROBE_MAX_TOKENS),
                stream: false,
                json_response: false,
            };
            self.transport.probe(probe).await.is_ok()
        })
    }
}

fn emit(
    fragments: Vec<String>,
    text: &mut CumulativeText,
    structured: Option<&mut StructuredFieldDecoder>,
    callbacks: &dyn StreamCallbacks,
    cancel: &CancellationToken,
) -> Result<(), ProviderError> {
    match structured {
        Some(decoder) => {
            for fragment in fragments {
                if let Some(value) = decoder.push(&fragment) {
                    if cancel.is_cancelled() {
                        return Err(cancelled());
                    }
                    callbacks.on_chunk(text.replace(value));
                }
            }
        }
        None => {
            for fragment in fragments.iter().filter(|fragment| !fragment.is_empty()) {
                if cancel.is_cancelled() {
                    return Err(cancelled());
                }
                callbacks.on_chunk(text.push(fragment));
            }
        }
    }
    Ok(())
}

fn cancelled() -> ProviderError {
    ProviderError::cancelled("generation call was cancelled")
}
