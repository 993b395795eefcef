//! Where filter snapshots live between runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use marquee_model::prelude::FilterSnapshot;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FilterStoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid service identity: {0:?}")]
    InvalidIdentity(String),
}

impl FilterStoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        FilterStoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type FilterStoreResult<T> = std::result::Result<T, FilterStoreError>;

/// Persistence for [`FilterSnapshot`]s keyed by service identity.
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved for `identity` yet.
    async fn load(
        &self,
        identity: &str,
    ) -> FilterStoreResult<Option<FilterSnapshot>>;

    async fn save(
        &self,
        identity: &str,
        snapshot: &FilterSnapshot,
    ) -> FilterStoreResult<()>;
}

/// One pretty-printed `<identity>.json` per service identity.
#[derive(Debug, Clone)]
pub struct JsonFileFilterStore {
    dir: PathBuf,
}

impl JsonFileFilterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `identity`. Identities are restricted to a portable file
    /// name alphabet.
    pub fn path_for(&self, identity: &str) -> FilterStoreResult<PathBuf> {
        let valid = !identity.is_empty()
            && !identity.starts_with('.')
            && identity
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(FilterStoreError::InvalidIdentity(identity.to_string()));
        }
        Ok(self.dir.join(format!("{identity}.json")))
    }
}

#[async_trait]
impl FilterStore for JsonFileFilterStore {
    async fn load(
        &self,
        identity: &str,
    ) -> FilterStoreResult<Option<FilterSnapshot>> {
        let path = self.path_for(identity)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(err) => return Err(FilterStoreError::io(&path, err)),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(
        &self,
        identity: &str,
        snapshot: &FilterSnapshot,
    ) -> FilterStoreResult<()> {
        let path = self.path_for(identity)?;
        let body = serde_json::to_vec_pretty(snapshot)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| FilterStoreError::io(&self.dir, err))?;

        // Write-then-rename so readers never observe a torn file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|err| FilterStoreError::io(&tmp, err))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|err| FilterStoreError::io(&path, err))?;

        debug!(path = %path.display(), "filter snapshot saved");
        Ok(())
    }
}

/// In-memory store that counts saves.
#[derive(Debug, Default)]
pub struct MemoryFilterStore {
    snapshots: Mutex<HashMap<String, FilterSnapshot>>,
    saves: AtomicUsize,
}

impl MemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(identity: &str, snapshot: FilterSnapshot) -> Self {
        let store = Self::default();
        store.snapshots.lock().insert(identity.to_string(), snapshot);
        store
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FilterStore for MemoryFilterStore {
    async fn load(
        &self,
        identity: &str,
    ) -> FilterStoreResult<Option<FilterSnapshot>> {
        Ok(self.snapshots.lock().get(identity).cloned())
    }

    async fn save(
        &self,
        identity: &str,
        snapshot: &FilterSnapshot,
    ) -> FilterStoreResult<()> {
        self.snapshots
            .lock()
            .insert(identity.to_string(), snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::prelude::{Keyword, MediaKind, ProviderId};

    #[tokio::test]
    async fn json_store_round_trips_and_misses_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileFilterStore::new(dir.path().join("state"));

        assert_eq!(store.load("catalog.example.com").await.expect("load"), None);

        let mut snapshot = FilterSnapshot {
            selected_media_kind: MediaKind::Tv,
            ..FilterSnapshot::default()
        };
        snapshot.selected_provider_ids.insert(ProviderId(8));
        snapshot.active_keywords.push(Keyword::new(5, "heist"));

        store
            .save("catalog.example.com", &snapshot)
            .await
            .expect("save");
        let loaded = store.load("catalog.example.com").await.expect("load");
        assert_eq!(loaded, Some(snapshot));
        assert!(!dir.path().join("state/catalog.example.com.json.tmp").exists());
    }

    #[test]
    fn rejects_path_like_identities() {
        let store = JsonFileFilterStore::new("/tmp/marquee");
        for bad in ["", "../etc", "a/b", ".hidden"] {
            assert!(matches!(
                store.path_for(bad),
                Err(FilterStoreError::InvalidIdentity(_))
            ));
        }
        assert!(store.path_for("api.example-2_x").is_ok());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("svc.json"), b"{not json").expect("write");
        let store = JsonFileFilterStore::new(dir.path());
        assert!(matches!(
            store.load("svc").await,
            Err(FilterStoreError::Serialization(_))
        ));
    }
}
