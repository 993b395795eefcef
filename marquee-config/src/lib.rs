//! Configuration for Marquee.
//!
//! One [`Config`] describes how to reach the catalog, how the session is
//! re-validated, how the discovery pipeline paces itself and where filter
//! snapshots are stored. [`ConfigLoader`] resolves it from files, inline JSON
//! and environment overrides; [`Config::validate`] guards the values the
//! core relies on.
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigSource};
pub use models::{
    CatalogConfig, Config, DiscoveryConfig, SessionConfig, StorageConfig,
};
pub use validation::ConfigError;
