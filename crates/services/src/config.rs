use std::env;

use certify_core::{EmptyStepPolicy, RetakePolicy};
use reqwest::Url;
use storage::rest::DEFAULT_API_URL;

use crate::error::ConfigError;

pub const DEFAULT_DB_URL: &str = "sqlite://certify.sqlite3";

pub const ENV_API_URL: &str = "CERTIFY_API_URL";
pub const ENV_DB_URL: &str = "CERTIFY_DB_URL";
pub const ENV_RETAKE_POLICY: &str = "CERTIFY_RETAKE_POLICY";
pub const ENV_EMPTY_STEP: &str = "CERTIFY_EMPTY_STEP";

/// Runtime settings shared by every service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub db_url: String,
    pub retake_policy: RetakePolicy,
    pub empty_step: EmptyStepPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            db_url: DEFAULT_DB_URL.into(),
            retake_policy: RetakePolicy::default(),
            empty_step: EmptyStepPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Read settings from `CERTIFY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(api_url) = get(ENV_API_URL) {
            config.api_url = api_url;
        }
        if let Some(db_url) = get(ENV_DB_URL) {
            config.db_url = db_url;
        }
        if let Some(raw) = get(ENV_RETAKE_POLICY) {
            config.retake_policy = raw.parse()?;
        }
        if let Some(raw) = get(ENV_EMPTY_STEP) {
            config.empty_step = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the API url is not http(s) or the database
    /// url is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidApiUrl {
            raw: self.api_url.clone(),
            reason,
        };
        let url = Url::parse(&self.api_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if self.db_url.trim().is_empty() {
            return Err(ConfigError::EmptyDbUrl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_url, "http://localhost:5000/api/v1/");
    }

    #[test]
    fn reads_policies_and_urls() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://certify.example/api/v1"),
            (ENV_DB_URL, "sqlite::memory:"),
            (ENV_RETAKE_POLICY, "advance"),
            (ENV_EMPTY_STEP, "zero"),
        ]))
        .unwrap();
        assert_eq!(config.retake_policy, RetakePolicy::Advance);
        assert_eq!(config.empty_step, EmptyStepPolicy::ZeroScore);
        assert_eq!(config.db_url, "sqlite::memory:");
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_DB_URL, "  ")])).unwrap();
        assert_eq!(config.db_url, DEFAULT_DB_URL);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_RETAKE_POLICY, "sometimes")])),
            Err(ConfigError::RetakePolicy(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_API_URL, "ftp://host/")])),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_API_URL, "not a url")])),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
    }
}
