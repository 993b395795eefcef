//! User-selected query facets and their persistence.

mod persister;
mod store;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use marquee_model::prelude::{
    FilterSnapshot, GenreId, Keyword, KeywordId, MediaKind, ProviderId,
};
use marquee_model::sort_by_name;
use tracing::warn;

pub use persister::FilterPersister;
pub use store::{
    FilterStore, FilterStoreError, FilterStoreResult, JsonFileFilterStore,
    MemoryFilterStore,
};

/// The active media kind, provider, genre and keyword facets.
///
/// Every mutator returns `true` only when the facets actually changed; that
/// return value is the "facets changed" signal. Each change is handed to the
/// persister (if any) without waiting for the write.
#[derive(Debug, Default)]
pub struct FilterState {
    snapshot: FilterSnapshot,
    persister: Option<FilterPersister>,
}

impl FilterState {
    /// Facets that are never persisted.
    pub fn new(initial: FilterSnapshot) -> Self {
        Self {
            snapshot: normalized(initial),
            persister: None,
        }
    }

    pub fn with_persister(
        initial: FilterSnapshot,
        persister: FilterPersister,
    ) -> Self {
        Self {
            snapshot: normalized(initial),
            persister: Some(persister),
        }
    }

    /// Load the snapshot saved for `identity` and keep persisting changes to
    /// the same store. A missing or unreadable snapshot starts from defaults.
    pub async fn restore(
        store: Arc<dyn FilterStore>,
        identity: &str,
        coalesce: Duration,
    ) -> Self {
        let initial = match store.load(identity).await {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(err) => {
                warn!(%identity, error = %err, "ignoring unreadable filter snapshot");
                FilterSnapshot::default()
            }
        };
        let persister = FilterPersister::spawn(store, identity, coalesce);
        Self::with_persister(initial, persister)
    }

    pub fn snapshot(&self) -> &FilterSnapshot {
        &self.snapshot
    }

    pub fn media_kind(&self) -> MediaKind {
        self.snapshot.selected_media_kind
    }

    pub fn provider_ids(&self) -> &BTreeSet<ProviderId> {
        &self.snapshot.selected_provider_ids
    }

    pub fn genre_ids(&self) -> &BTreeSet<GenreId> {
        &self.snapshot.selected_genre_ids
    }

    pub fn active_keyword_ids(&self) -> BTreeSet<KeywordId> {
        self.snapshot.active_keyword_ids()
    }

    /// Active keywords in display order.
    pub fn active_keywords(&self) -> &[Keyword] {
        &self.snapshot.active_keywords
    }

    pub fn is_keyword_active(&self, id: KeywordId) -> bool {
        self.snapshot.active_keywords.iter().any(|k| k.id == id)
    }

    pub fn set_media_kind(&mut self, kind: MediaKind) -> bool {
        self.update(|s| s.selected_media_kind = kind)
    }

    pub fn set_provider_ids(&mut self, ids: BTreeSet<ProviderId>) -> bool {
        self.update(|s| s.selected_provider_ids = ids)
    }

    pub fn toggle_provider(&mut self, id: ProviderId) -> bool {
        self.update(|s| toggle(&mut s.selected_provider_ids, id))
    }

    pub fn set_genre_ids(&mut self, ids: BTreeSet<GenreId>) -> bool {
        self.update(|s| s.selected_genre_ids = ids)
    }

    pub fn toggle_genre(&mut self, id: GenreId) -> bool {
        self.update(|s| toggle(&mut s.selected_genre_ids, id))
    }

    pub fn set_active_keywords(&mut self, keywords: Vec<Keyword>) -> bool {
        self.update(|s| s.active_keywords = keywords)
    }

    /// Add `keyword` unless its id is already active.
    pub fn insert_keyword(&mut self, keyword: Keyword) -> bool {
        if self.is_keyword_active(keyword.id) {
            return false;
        }
        self.update(|s| s.active_keywords.push(keyword))
    }

    pub fn remove_keyword(&mut self, id: KeywordId) -> bool {
        self.update(|s| s.active_keywords.retain(|k| k.id != id))
    }

    /// Flush pending writes and stop the persister.
    pub async fn close(self) {
        if let Some(persister) = self.persister {
            persister.close().await;
        }
    }

    fn update(&mut self, f: impl FnOnce(&mut FilterSnapshot)) -> bool {
        let mut next = self.snapshot.clone();
        f(&mut next);
        let next = normalized(next);
        if next == self.snapshot {
            return false;
        }
        self.snapshot = next;
        if let Some(persister) = &self.persister {
            persister.submit(self.snapshot.clone());
        }
        true
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

/// Keywords kept unique by id and sorted for display.
fn normalized(mut snapshot: FilterSnapshot) -> FilterSnapshot {
    let mut seen = BTreeSet::new();
    snapshot.active_keywords.retain(|k| seen.insert(k.id));
    sort_by_name(&mut snapshot.active_keywords);
    snapshot
}
