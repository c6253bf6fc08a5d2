//! Provider-agnostic identifiers and generation request types.
//!
//! ```rust
//! use sprovider::{GenerationRequest, ProviderErrorKind, ProviderId};
//!
//! let ok = GenerationRequest::builder("Liver: steatosis (moderate)")
//!     .model("gemini-1.5-pro")
//!     .max_tokens(2048)
//!     .build();
//! assert!(ok.is_ok());
//!
//! let err = GenerationRequest::builder("   ").build().err().expect("empty prompt should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//!
//! assert_eq!("anthropic".parse::<ProviderId>(), Ok(ProviderId::Claude));
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use scommon::GenerationOptions;

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    Gemini,
    OpenAi,
    Claude,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::Gemini, ProviderId::OpenAi, ProviderId::Claude];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Claude => "claude",
        }
    }

    /// Model used when neither the request nor a user override names one.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-pro",
            Self::OpenAi => "gpt-4",
            Self::Claude => "claude-sonnet-4-5",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "gpt" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            other => Err(ProviderError::configuration(format!(
                "unknown provider '{other}'"
            ))),
        }
    }
}

/// One generation call as seen by an adapter.
///
/// An empty `model` asks the adapter to resolve its own model (session
/// override first, then its configured default).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub system_instruction: Option<String>,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn builder(prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder::new(prompt)
    }

    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system_instruction: None,
            options: GenerationOptions::default().enable_streaming(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.prompt.trim().is_empty() {
            return Err(ProviderError::invalid_request("prompt must not be empty"));
        }

        if let Some(max_tokens) = self.options.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequestBuilder {
    prompt: String,
    model: String,
    system_instruction: Option<String>,
    options: GenerationOptions,
}

impl GenerationRequestBuilder {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: String::new(),
            system_instruction: None,
            options: GenerationOptions::default().enable_streaming(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.options.stream = stream;
        self
    }

    pub fn build(self) -> Result<GenerationRequest, ProviderError> {
        let request = GenerationRequest {
            prompt: self.prompt,
            model: self.model,
            system_instruction: self.system_instruction,
            options: self.options,
        };

        request.validate()?;
        Ok(request)
    }
}
