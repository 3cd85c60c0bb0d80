use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8200";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Validated settings for talking to the portal backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    api_base_url: Url,
    timeout: Duration,
    retry_attempts: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ClientSettingsDraft {
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retry_attempts: Option<u32>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClientSettingsError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("timeout must be > 0 seconds")]
    InvalidTimeout,
    #[error("retry attempts must be > 0")]
    InvalidRetryAttempts,
}

impl ClientSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and fill defaults.
    ///
    /// # Errors
    ///
    /// Returns `ClientSettingsError` if the base URL is not an http(s) URL or a
    /// numeric knob is zero.
    pub fn validate(self) -> Result<ClientSettings, ClientSettingsError> {
        let raw = normalize_optional(self.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url =
            Url::parse(&raw).map_err(|_| ClientSettingsError::InvalidBaseUrl(raw.clone()))?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ClientSettingsError::InvalidBaseUrl(raw));
        }

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ClientSettingsError::InvalidTimeout);
        }
        let retry_attempts = self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS);
        if retry_attempts == 0 {
            return Err(ClientSettingsError::InvalidRetryAttempts);
        }

        Ok(ClientSettings {
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
            retry_attempts,
        })
    }
}

impl ClientSettings {
    #[must_use]
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// Join an API path (e.g. `/api/public/catalogo/`) onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
