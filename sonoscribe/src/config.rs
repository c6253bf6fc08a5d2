//! Environment configuration resolved once at process start.
//!
//! Every key is optional. Relative provider endpoints are joined to
//! `SONOSCRIBE_BASE_URL`, and blank API keys count as unset.
//!
//! ```rust
//! use sonoscribe::{ProviderId, ScribeConfig};
//!
//! let config = ScribeConfig::from_lookup(|key| match key {
//!     "SONOSCRIBE_BASE_URL" => Some("https://scribe.example.org".to_string()),
//!     "SONOSCRIBE_PROVIDER" => Some("claude".to_string()),
//!     _ => None,
//! })
//! .expect("config should resolve");
//!
//! assert_eq!(config.default_provider, ProviderId::Claude);
//! assert_eq!(
//!     config.endpoint(ProviderId::Claude).map(|endpoint| endpoint.url.as_str()),
//!     Some("https://scribe.example.org/api/claude")
//! );
//! ```

use std::fmt::{Display, Formatter};
use std::time::Duration;

use reqwest::Url;
use scall::{
    CallSettings, DEFAULT_DEBOUNCE, DEFAULT_DUPLICATE_WINDOW, DEFAULT_STALE_AFTER,
};
use sprovider::{ProviderId, SecretString};

pub const DEFAULT_BASE_URL: &str = "http://localhost";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Missing,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub key: String,
    pub message: String,
}

impl ConfigError {
    pub fn missing(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::Missing,
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::Invalid,
            key: key.into(),
            message: message.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}: {}", self.kind, self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Where one provider's proxy lives and how it is called.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEndpoint {
    pub provider_id: ProviderId,
    pub url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    /// Set to request structured JSON output and stream only this field.
    pub structured_field: Option<String>,
}

impl ProviderEndpoint {
    pub fn default_path(provider_id: ProviderId) -> String {
        format!("/api/{provider_id}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScribeConfig {
    pub base_url: String,
    pub default_provider: ProviderId,
    pub endpoints: Vec<ProviderEndpoint>,
    pub debounce: Duration,
    pub stale_after: Duration,
    pub duplicate_window: Duration,
    pub http_timeout: Duration,
}

impl ScribeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|value| value.trim().to_string());

        let base_url = read("SONOSCRIBE_BASE_URL")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base = Url::parse(&base_url)
            .map_err(|err| ConfigError::invalid("SONOSCRIBE_BASE_URL", err.to_string()))?;

        let default_provider = match read("SONOSCRIBE_PROVIDER").filter(|value| !value.is_empty()) {
            Some(value) => value
                .parse::<ProviderId>()
                .map_err(|err| ConfigError::invalid("SONOSCRIBE_PROVIDER", err.message))?,
            None => ProviderId::Gemini,
        };

        let mut endpoints = Vec::with_capacity(ProviderId::ALL.len());
        for provider_id in ProviderId::ALL {
            endpoints.push(Self::read_endpoint(&read, &base, provider_id)?);
        }

        let config = Self {
            base_url,
            default_provider,
            endpoints,
            debounce: read_millis(&read, "SONOSCRIBE_DEBOUNCE_MS")?.unwrap_or(DEFAULT_DEBOUNCE),
            stale_after: read_millis(&read, "SONOSCRIBE_STALE_AFTER_MS")?
                .unwrap_or(DEFAULT_STALE_AFTER),
            duplicate_window: read_millis(&read, "SONOSCRIBE_DUPLICATE_WINDOW_MS")?
                .unwrap_or(DEFAULT_DUPLICATE_WINDOW),
            http_timeout: match read_number(&read, "SONOSCRIBE_HTTP_TIMEOUT_SECS")? {
                Some(0) => {
                    return Err(ConfigError::invalid(
                        "SONOSCRIBE_HTTP_TIMEOUT_SECS",
                        "timeout must be greater than zero",
                    ));
                }
                Some(secs) => Duration::from_secs(secs),
                None => DEFAULT_HTTP_TIMEOUT,
            },
        };

        tracing::debug!(
            phase = "config",
            event = "resolved",
            base_url = %config.base_url,
            default_provider = %config.default_provider
        );
        Ok(config)
    }

    pub fn endpoint(&self, provider_id: ProviderId) -> Option<&ProviderEndpoint> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.provider_id == provider_id)
    }

    /// Call thresholds derived from this configuration; per-kind settings keep their defaults.
    pub fn call_settings(&self) -> CallSettings {
        CallSettings::default()
            .with_debounce(self.debounce)
            .with_stale_after(self.stale_after)
            .with_duplicate_window(self.duplicate_window)
    }

    fn read_endpoint<R>(
        read: &R,
        base: &Url,
        provider_id: ProviderId,
    ) -> Result<ProviderEndpoint, ConfigError>
    where
        R: Fn(&str) -> Option<String>,
    {
        let prefix = format!("SONOSCRIBE_{}", provider_id.as_str().to_ascii_uppercase());
        let url_key = format!("{prefix}_URL");
        let model_key = format!("{prefix}_MODEL");

        let url = match read(&url_key) {
            Some(value) if value.is_empty() => {
                return Err(ConfigError::missing(url_key, "endpoint is set but empty"));
            }
            Some(value) => value,
            None => ProviderEndpoint::default_path(provider_id),
        };
        let url = base
            .join(&url)
            .map_err(|err| ConfigError::invalid(&url_key, err.to_string()))?
            .to_string();

        let model = match read(&model_key) {
            Some(value) if value.is_empty() => {
                return Err(ConfigError::missing(model_key, "model is set but empty"));
            }
            Some(value) => value,
            None => provider_id.default_model().to_string(),
        };

        Ok(ProviderEndpoint {
            provider_id,
            url,
            model,
            api_key: read(&format!("{prefix}_API_KEY"))
                .filter(|value| !value.is_empty())
                .map(SecretString::new),
            structured_field: read(&format!("{prefix}_STRUCTURED_FIELD"))
                .filter(|value| !value.is_empty()),
        })
    }
}

impl Default for ScribeConfig {
    fn default() -> Self {
        let base = Url::parse(DEFAULT_BASE_URL).ok();
        let endpoints = ProviderId::ALL
            .into_iter()
            .map(|provider_id| {
                let path = ProviderEndpoint::default_path(provider_id);
                ProviderEndpoint {
                    provider_id,
                    url: base
                        .as_ref()
                        .and_then(|base| base.join(&path).ok())
                        .map(|url| url.to_string())
                        .unwrap_or(path),
                    model: provider_id.default_model().to_string(),
                    api_key: None,
                    structured_field: None,
                }
            })
            .collect();

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_provider: ProviderId::Gemini,
            endpoints,
            debounce: DEFAULT_DEBOUNCE,
            stale_after: DEFAULT_STALE_AFTER,
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

fn read_number<R>(read: &R, key: &str) -> Result<Option<u64>, ConfigError>
where
    R: Fn(&str) -> Option<String>,
{
    match read(key).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|err| ConfigError::invalid(key, format!("'{value}': {err}"))),
        None => Ok(None),
    }
}

fn read_millis<R>(read: &R, key: &str) -> Result<Option<Duration>, ConfigError>
where
    R: Fn(&str) -> Option<String>,
{
    Ok(read_number(read, key)?.map(Duration::from_millis))
}
