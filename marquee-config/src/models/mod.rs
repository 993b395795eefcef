use std::path::PathBuf;
use std::time::Duration;

use marquee_core::discovery::DiscoverySettings;
use marquee_core::session::SessionSettings;
use serde::{Deserialize, Serialize};

use crate::util::humantime_duration;

/// Complete Marquee configuration. Every section falls back to defaults, so
/// a file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub session: SessionConfig,
    pub discovery: DiscoveryConfig,
    pub storage: StorageConfig,
}

/// How to reach the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// API root; endpoint paths are resolved against it.
    pub base_url: String,
    /// Key under which filter snapshots are stored. Defaults to the host of
    /// `base_url`.
    pub service_identity: Option<String>,
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://catalog.example.com/3/".to_string(),
            service_identity: None,
            request_timeout: Duration::from_secs(15),
            user_agent: concat!("marquee/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie whose presence suggests a live session.
    pub cookie_name: String,
    /// Endpoint answering 200 for a live session, 401/403 otherwise.
    pub check_path: String,
    /// Minimum spacing between throttled session probes.
    #[serde(with = "humantime_duration")]
    pub probe_throttle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            check_path: "account/session".to_string(),
            probe_throttle: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    #[serde(with = "humantime_duration")]
    pub search_debounce: Duration,
    /// Rows from the loaded end at which the next page is requested.
    pub prefetch_threshold: usize,
    /// Window over which filter changes are coalesced before saving.
    #[serde(with = "humantime_duration")]
    pub persist_coalesce: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            prefetch_threshold: 5,
            persist_coalesce: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one filter snapshot per service identity.
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".marquee"),
        }
    }
}

impl Config {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            cookie_name: self.session.cookie_name.clone(),
            probe_throttle: self.session.probe_throttle,
        }
    }

    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            search_debounce: self.discovery.search_debounce,
            prefetch_threshold: self.discovery.prefetch_threshold,
            ..DiscoverySettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [discovery]
            search_debounce = "150ms"

            [session]
            cookie_name = "sid"
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.discovery.search_debounce, Duration::from_millis(150));
        assert_eq!(config.discovery.prefetch_threshold, 5);
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.probe_throttle, Duration::from_secs(30));
        assert_eq!(config.catalog, CatalogConfig::default());
    }

    #[test]
    fn durations_serialize_human_readable() {
        let json = serde_json::to_value(DiscoveryConfig::default())
            .expect("serializes");
        assert_eq!(json["search_debounce"], "300ms");
        assert_eq!(json["persist_coalesce"], "500ms");
    }

    #[test]
    fn converts_into_core_settings() {
        let mut config = Config::default();
        config.session.probe_throttle = Duration::from_secs(5);
        config.discovery.prefetch_threshold = 8;

        assert_eq!(
            config.session_settings().probe_throttle,
            Duration::from_secs(5)
        );
        assert_eq!(config.discovery_settings().prefetch_threshold, 8);
    }
}
