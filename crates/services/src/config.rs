use std::env;

use portal_core::model::{ClientSettings, ClientSettingsDraft, ClientSettingsError};

pub const API_URL_ENV: &str = "PORTAL_API_URL";
pub const TIMEOUT_ENV: &str = "PORTAL_TIMEOUT_SECS";
pub const RETRY_ATTEMPTS_ENV: &str = "PORTAL_RETRY_ATTEMPTS";

/// Backend connection settings gathered from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    settings: ClientSettings,
}

impl ApiConfig {
    /// Read `PORTAL_API_URL`, `PORTAL_TIMEOUT_SECS` and `PORTAL_RETRY_ATTEMPTS`.
    ///
    /// # Errors
    ///
    /// Returns `ClientSettingsError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ClientSettingsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, with an explicit base URL taking precedence.
    ///
    /// # Errors
    ///
    /// Returns `ClientSettingsError` if any value is invalid.
    pub fn from_env_with_url(api_url: Option<String>) -> Result<Self, ClientSettingsError> {
        Self::from_lookup(|key| {
            if key == API_URL_ENV && api_url.is_some() {
                api_url.clone()
            } else {
                env::var(key).ok()
            }
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientSettingsError> {
        let timeout_secs = lookup(TIMEOUT_ENV)
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ClientSettingsError::InvalidTimeout)
            })
            .transpose()?;
        let retry_attempts = lookup(RETRY_ATTEMPTS_ENV)
            .map(|raw| {
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| ClientSettingsError::InvalidRetryAttempts)
            })
            .transpose()?;

        let settings = ClientSettingsDraft {
            api_base_url: lookup(API_URL_ENV),
            timeout_secs,
            retry_attempts,
        }
        .validate()?;
        Ok(Self { settings })
    }

    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.settings().api_base_url().as_str(), "http://localhost:8200/");
        assert_eq!(config.settings().timeout(), Duration::from_secs(15));
        assert_eq!(config.settings().retry_attempts(), 3);
    }

    #[test]
    fn reads_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            (API_URL_ENV, "https://portal.example.com"),
            (TIMEOUT_ENV, " 30 "),
            (RETRY_ATTEMPTS_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(
            config.settings().endpoint("/api/token/"),
            "https://portal.example.com/api/token/"
        );
        assert_eq!(config.settings().timeout(), Duration::from_secs(30));
        assert_eq!(config.settings().retry_attempts(), 5);
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = ApiConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")])).unwrap_err();
        assert_eq!(err, ClientSettingsError::InvalidTimeout);
        let err = ApiConfig::from_lookup(lookup(&[(RETRY_ATTEMPTS_ENV, "0")])).unwrap_err();
        assert_eq!(err, ClientSettingsError::InvalidRetryAttempts);
    }
}
