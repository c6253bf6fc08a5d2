//! Proxy transport trait and reqwest-based HTTP implementation.

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode, header::CONTENT_TYPE};

use crate::{ProviderError, ProviderFuture, SecretString};

use super::serde_api::{build_api_request, extract_error_message};
use super::types::{BodyFormat, ProxyRequest, ProxyResponse};

pub trait ProxyTransport: Send + Sync + std::fmt::Debug {
    /// Whether the transport has everything it needs to attempt a request.
    fn is_configured(&self) -> bool;

    fn open_stream<'a>(
        &'a self,
        request: ProxyRequest,
    ) -> ProviderFuture<'a, Result<ProxyResponse, ProviderError>>;

    /// Sends a small non-streaming request and only checks for success.
    fn probe<'a>(&'a self, request: ProxyRequest) -> ProviderFuture<'a, Result<(), ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct ReqwestProxyTransport {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl ReqwestProxyTransport {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: ProxyRequest) -> Result<Response, ProviderError> {
        let api_request = build_api_request(request);
        let mut builder = self.client.post(&self.endpoint).json(&api_request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose());
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::timeout(err.to_string())
            } else {
                ProviderError::transport(err.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }
        Ok(response)
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("proxy request failed with status {status}"));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::authentication(message)
            }
            StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ProviderError::timeout(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ProviderError::invalid_request(message)
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                ProviderError::unavailable(message)
            }
            _ => ProviderError::transport(message),
        }
    }
}

impl ProxyTransport for ReqwestProxyTransport {
    fn is_configured(&self) -> bool {
        reqwest::Url::parse(&self.endpoint).is_ok()
    }

    fn open_stream<'a>(
        &'a self,
        mut request: ProxyRequest,
    ) -> ProviderFuture<'a, Result<ProxyResponse, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let response = self.send(request).await?;
            let format = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(BodyFormat::from_content_type)
                .unwrap_or(BodyFormat::PlainText);

            let body = try_stream! {
                let mut chunks = response.bytes_stream();
                while let Some(item) = chunks.next().await {
                    let bytes = item.map_err(|err| {
                        if err.is_timeout() {
                            ProviderError::timeout(err.to_string())
                        } else {
                            ProviderError::transport(err.to_string())
                        }
                    })?;
                    yield bytes.to_vec();
                }
            };

            Ok(ProxyResponse::new(format, Box::pin(body)))
        })
    }

    fn probe<'a>(&'a self, mut request: ProxyRequest) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            request.stream = false;
            self.send(request).await.map(|_| ())
        })
    }
}
