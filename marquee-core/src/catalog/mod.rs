//! The catalog capability the core depends on.
//!
//! The core never talks HTTP itself. Everything it needs from the third-party
//! catalog goes through [`CatalogClient`]; [`HttpCatalogClient`] is the
//! production variant and `testing::StubCatalog` the programmable one used by
//! tests and demos.

pub mod http;
pub mod wire;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::prelude::{
    FilterSnapshot, GenreId, Keyword, KeywordId, MediaKind, MediaListItem,
    MediaRef, Page, ProviderId,
};

use crate::error::CatalogResult;

pub use http::{HttpCatalogClient, HttpCatalogSettings};

/// A cookie held by the client's local cookie jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Facet-filtered discover request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DiscoverQuery {
    pub media_kind: MediaKind,
    pub provider_ids: BTreeSet<ProviderId>,
    pub genre_ids: BTreeSet<GenreId>,
    pub keyword_ids: BTreeSet<KeywordId>,
}

impl DiscoverQuery {
    /// Discover call filtered only by a single keyword. Used when probing
    /// whether a keyword yields anything at all.
    pub fn keyword_probe(media_kind: MediaKind, keyword: KeywordId) -> Self {
        Self {
            media_kind,
            keyword_ids: BTreeSet::from([keyword]),
            ..Self::default()
        }
    }

    pub fn from_filters(filters: &FilterSnapshot) -> Self {
        Self {
            media_kind: filters.selected_media_kind,
            provider_ids: filters.selected_provider_ids.clone(),
            genre_ids: filters.selected_genre_ids.clone(),
            keyword_ids: filters.active_keyword_ids(),
        }
    }
}

/// Operations the core consumes from the catalog.
///
/// Every fallible operation distinguishes
/// [`CatalogError::Authorization`](crate::error::CatalogError::Authorization)
/// (session rejected) from transport and decoding failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Look up a cookie by name in the local jar. No network access.
    fn session_cookie(&self, name: &str) -> Option<SessionCookie>;

    /// Authoritative session check against the catalog.
    async fn is_authenticated(&self) -> CatalogResult<bool>;

    /// Free-text search across movies and TV. The selected media kind is
    /// deliberately not applied; results mix both kinds.
    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>>;

    /// Facet-filtered listing.
    async fn discover(
        &self,
        query: &DiscoverQuery,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>>;

    /// Keyword suggestions for a free-text term.
    async fn keyword_search(&self, query: &str) -> CatalogResult<Vec<Keyword>>;

    /// Titles of `kind` recommended for `seed`.
    async fn recommendations(
        &self,
        seed: MediaRef,
        kind: MediaKind,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>>;

    /// Weekly trending titles of `kind`.
    async fn trending(
        &self,
        kind: MediaKind,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>>;

    /// Invalidate the session server-side and drop local cookies.
    async fn end_session(&self) -> CatalogResult<()> {
        Ok(())
    }
}
