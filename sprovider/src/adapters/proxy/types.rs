//! Proxy adapter request/response types.

use std::fmt::{Debug, Formatter};
use std::pin::Pin;

use futures_core::Stream;

use crate::ProviderError;

pub type ProxyByteStream =
    Pin<Box<dyn Stream<Item = Result<Vec<u8>, ProviderError>> + Send + 'static>>;

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stream: bool,
    pub json_response: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    EventStream,
    JsonLines,
    PlainText,
}

impl BodyFormat {
    pub fn from_content_type(content_type: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("text/event-stream") {
            Self::EventStream
        } else if content_type.contains("ndjson") || content_type.contains("jsonlines") {
            Self::JsonLines
        } else {
            Self::PlainText
        }
    }
}

pub struct ProxyResponse {
    pub format: BodyFormat,
    pub body: ProxyByteStream,
}

impl ProxyResponse {
    pub fn new(format: BodyFormat, body: ProxyByteStream) -> Self {
        Self { format, body }
    }
}

impl Debug for ProxyResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyResponse")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
