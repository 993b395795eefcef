use std::time::Duration;

use marquee_core::catalog::HttpCatalogSettings;
use thiserror::Error;
use url::Url;

use crate::models::Config;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("catalog.base_url {url:?} is not a valid URL: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("catalog.base_url must use http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl Config {
    /// Reject values the core cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Empty("session.cookie_name"));
        }
        if self.session.check_path.trim().is_empty() {
            return Err(ConfigError::Empty("session.check_path"));
        }
        if self.service_identity()?.is_empty() {
            return Err(ConfigError::Empty("catalog.service_identity"));
        }
        if self.discovery.prefetch_threshold == 0 {
            return Err(ConfigError::Zero("discovery.prefetch_threshold"));
        }
        if self.discovery.search_debounce == Duration::ZERO {
            return Err(ConfigError::Zero("discovery.search_debounce"));
        }
        if self.catalog.request_timeout == Duration::ZERO {
            return Err(ConfigError::Zero("catalog.request_timeout"));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.catalog.base_url.trim();
        let url = Url::parse(raw).map_err(|err| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Explicit identity, or the host of the base URL.
    pub fn service_identity(&self) -> Result<String, ConfigError> {
        if let Some(identity) = &self.catalog.service_identity {
            return Ok(identity.trim().to_string());
        }
        Ok(self
            .base_url()?
            .host_str()
            .unwrap_or_default()
            .to_string())
    }

    pub fn http_settings(&self) -> Result<HttpCatalogSettings, ConfigError> {
        Ok(HttpCatalogSettings {
            base_url: self.base_url()?,
            session_check_path: self.session.check_path.clone(),
            session_cookie_name: self.session.cookie_name.clone(),
            request_timeout: self.catalog.request_timeout,
            user_agent: self.catalog.user_agent.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.service_identity().unwrap(), "catalog.example.com");
    }

    #[test]
    fn rejects_bad_base_urls() {
        let mut config = Config::default();
        config.catalog.base_url = "not a url".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));

        config.catalog.base_url = "ftp://catalog.example.com/".into();
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnsupportedScheme("ftp".into()))
        );
    }

    #[test]
    fn rejects_empty_and_zero_values() {
        let mut config = Config::default();
        config.session.cookie_name = " ".into();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty("session.cookie_name"))
        );

        let mut config = Config::default();
        config.catalog.service_identity = Some(String::new());
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty("catalog.service_identity"))
        );

        let mut config = Config::default();
        config.discovery.prefetch_threshold = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero("discovery.prefetch_threshold"))
        );

        let mut config = Config::default();
        config.discovery.search_debounce = Duration::ZERO;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero("discovery.search_debounce"))
        );
    }

    #[test]
    fn http_settings_follow_config() {
        let mut config = Config::default();
        config.session.check_path = "me".into();
        let settings = config.http_settings().expect("valid");
        assert_eq!(settings.session_check_path, "me");
        assert_eq!(settings.base_url.host_str(), Some("catalog.example.com"));
    }
}
