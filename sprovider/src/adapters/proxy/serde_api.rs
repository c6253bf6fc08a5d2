//! Wire shapes for the chat-style proxy endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::ProxyRequest;

#[derive(Debug, Serialize)]
pub(crate) struct ProxyApiRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<ProxyApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_tokens: Option<u32>,
    pub(crate) stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) response_format: Option<ProxyApiResponseFormat>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProxyApiMessage {
    pub(crate) role: &'static str,
    pub(crate) content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProxyApiResponseFormat {
    #[serde(rename = "type")]
    pub(crate) kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ProxyApiErrorEnvelope {
    error: ProxyApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProxyApiErrorBody {
    message: String,
}

pub(crate) fn build_api_request(request: ProxyRequest) -> ProxyApiRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system_instruction.filter(|s| !s.trim().is_empty()) {
        messages.push(ProxyApiMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ProxyApiMessage {
        role: "user",
        content: request.prompt,
    });

    ProxyApiRequest {
        model: request.model,
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        stream: request.stream,
        response_format: request.json_response.then_some(ProxyApiResponseFormat {
            kind: "json_object",
        }),
    }
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ProxyApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
}

/// Pulls the text delta out of one decoded JSON event.
///
/// Recognised shapes, first match wins: chat-completion `choices[].delta.content`,
/// `{"type":"response.output_text.delta","delta":..}`, then top-level
/// `text`, `output_text` or `content` strings.
pub(crate) fn extract_text(value: &Value) -> String {
    if let Some(choices) = value.get("choices").and_then(Value::as_array) {
        return choices
            .iter()
            .filter_map(|choice| {
                choice
                    .get("delta")
                    .and_then(|delta| delta.get("content"))
                    .and_then(Value::as_str)
            })
            .collect();
    }

    if value.get("type").and_then(Value::as_str) == Some("response.output_text.delta") {
        if let Some(delta) = value.get("delta").and_then(Value::as_str) {
            return delta.to_string();
        }
    }

    ["text", "output_text", "content"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}
