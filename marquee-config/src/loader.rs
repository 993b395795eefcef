//! Resolve a [`Config`] from files, inline JSON and the environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info};

use crate::models::Config;
use crate::util::non_empty;

pub const CONFIG_PATH_VAR: &str = "MARQUEE_CONFIG_PATH";
pub const CONFIG_JSON_VAR: &str = "MARQUEE_CONFIG_JSON";
pub const BASE_URL_VAR: &str = "MARQUEE_BASE_URL";
pub const SESSION_COOKIE_VAR: &str = "MARQUEE_SESSION_COOKIE";
pub const STATE_DIR_VAR: &str = "MARQUEE_STATE_DIR";

const DEFAULT_FILES: &[&str] = &[
    "marquee.toml",
    "marquee.json",
    "config/marquee.toml",
    "config/marquee.json",
];

/// Where the base configuration came from, before env overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    /// Path given on the command line
    Explicit(PathBuf),
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// A validated configuration and how it was assembled.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub source: ConfigSource,
    /// Environment variables that overrode file values
    pub overrides: Vec<&'static str>,
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Evaluation order:
/// 1) an explicit path (`--config`),
/// 2) `$MARQUEE_CONFIG_PATH` (TOML or JSON file),
/// 3) `$MARQUEE_CONFIG_JSON` (inline JSON),
/// 4) the first default file found under the search root,
/// 5) built-in defaults.
///
/// `MARQUEE_BASE_URL`, `MARQUEE_SESSION_COOKIE` and `MARQUEE_STATE_DIR` are
/// applied on top, then the result is validated.
pub struct ConfigLoader {
    env: EnvLookup,
    search_root: PathBuf,
    explicit_path: Option<PathBuf>,
    read_dotenv: bool,
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("search_root", &self.search_root)
            .field("explicit_path", &self.explicit_path)
            .field("read_dotenv", &self.read_dotenv)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader over the process environment, searching the working directory
    /// and reading `.env` first.
    pub fn new() -> Self {
        Self {
            env: Box::new(|name| std::env::var(name).ok()),
            search_root: PathBuf::from("."),
            explicit_path: None,
            read_dotenv: true,
        }
    }

    /// Replace the environment with `lookup`. Also disables `.env` loading.
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.env = Box::new(lookup);
        self.read_dotenv = false;
        self
    }

    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_root = root.into();
        self
    }

    pub fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    fn var(&self, name: &str) -> Option<String> {
        non_empty((self.env)(name))
    }

    pub fn load(&self) -> anyhow::Result<ConfigLoad> {
        if self.read_dotenv {
            match dotenvy::dotenv() {
                Ok(path) => debug!(path = %path.display(), "loaded .env"),
                Err(err) if err.not_found() => {}
                Err(err) => return Err(err).context("failed to read .env"),
            }
        }

        let (mut config, source) = self.resolve()?;
        let overrides = self.apply_overrides(&mut config);
        config
            .validate()
            .with_context(|| format!("invalid configuration from {source:?}"))?;

        info!(?source, ?overrides, "configuration loaded");
        Ok(ConfigLoad {
            config,
            source,
            overrides,
        })
    }

    fn resolve(&self) -> anyhow::Result<(Config, ConfigSource)> {
        if let Some(path) = &self.explicit_path {
            let config = load_from_file(path)?;
            return Ok((config, ConfigSource::Explicit(path.clone())));
        }

        if let Some(path) = self.var(CONFIG_PATH_VAR) {
            let path = PathBuf::from(path);
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Some(raw) = self.var(CONFIG_JSON_VAR) {
            let parsed = parse_json(&raw)
                .with_context(|| format!("failed to parse {CONFIG_JSON_VAR}"))?;
            return Ok((parsed, ConfigSource::EnvInline));
        }

        if let Some(path) = self.find_default_file() {
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((Config::default(), ConfigSource::Default))
    }

    fn apply_overrides(&self, config: &mut Config) -> Vec<&'static str> {
        let mut applied = Vec::new();
        if let Some(url) = self.var(BASE_URL_VAR) {
            config.catalog.base_url = url;
            applied.push(BASE_URL_VAR);
        }
        if let Some(name) = self.var(SESSION_COOKIE_VAR) {
            config.session.cookie_name = name;
            applied.push(SESSION_COOKIE_VAR);
        }
        if let Some(dir) = self.var(STATE_DIR_VAR) {
            config.storage.state_dir = PathBuf::from(dir);
            applied.push(STATE_DIR_VAR);
        }
        applied
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        DEFAULT_FILES
            .iter()
            .map(|candidate| self.search_root.join(candidate))
            .find(|path| path.exists())
    }
}

pub fn load_from_file(path: &Path) -> anyhow::Result<Config> {
    let contents = fs::read_to_string(path).with_context(|| {
        format!("failed to read config from {}", path.display())
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&contents)
            .with_context(|| format!("invalid config {}", path.display())),
        Some("toml") => toml::from_str(&contents).map_err(|err| {
            anyhow!("invalid config {}: {}", path.display(), err)
        }),
        _ => parse_from_str(&contents, &path.display().to_string()),
    }
}

pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Config> {
    // TOML first, then JSON
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            anyhow!(
                "failed to parse config {}: toml error: {}; json error: {}",
                origin,
                toml_err,
                json_err
            )
        })
    })
}

pub fn parse_json(raw: &str) -> anyhow::Result<Config> {
    serde_json::from_str(raw).map_err(|err| anyhow!("invalid config json: {err}"))
}
