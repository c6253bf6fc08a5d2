//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use sprovider::ProviderError;
//!
//! let config = ProviderError::configuration("gemini endpoint is not set");
//! assert!(!config.retryable);
//! assert!(!config.is_transport());
//!
//! let timeout = ProviderError::timeout("no response within 30s");
//! assert!(timeout.retryable);
//! assert!(timeout.is_transport());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    Configuration,
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    Decode,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Configuration, message, false)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Decode, message, false)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Cancelled, message, false)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    /// Network-level failures; a timeout counts as one.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::Transport
                | ProviderErrorKind::Timeout
                | ProviderErrorKind::Unavailable
                | ProviderErrorKind::RateLimited
                | ProviderErrorKind::Authentication
        )
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_builders_assign_expected_retryability() {
        let auth = ProviderError::authentication("bad key");
        assert!(!auth.retryable);
        assert_eq!(auth.kind, ProviderErrorKind::Authentication);

        let timeout = ProviderError::timeout("request timed out");
        assert!(timeout.retryable);
        assert_eq!(timeout.kind, ProviderErrorKind::Timeout);

        let decode = ProviderError::decode("truncated json");
        assert!(!decode.retryable);
        assert_eq!(decode.kind, ProviderErrorKind::Decode);
    }

    #[test]
    fn transport_family_includes_timeout_but_not_configuration() {
        assert!(ProviderError::transport("reset").is_transport());
        assert!(ProviderError::timeout("slow").is_transport());
        assert!(ProviderError::unavailable("502").is_transport());
        assert!(!ProviderError::configuration("missing url").is_transport());
        assert!(!ProviderError::decode("bad json").is_transport());
        assert!(!ProviderError::cancelled("stopped").is_transport());
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = ProviderError::configuration("claude endpoint missing");
        assert_eq!(error.to_string(), "Configuration: claude endpoint missing");
    }
}
