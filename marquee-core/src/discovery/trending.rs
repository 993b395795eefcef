//! Weekly trending titles with infinite scroll.

use std::sync::Arc;

use marquee_model::prelude::{MediaKind, MediaListItem};
use tracing::{debug, warn};

use crate::catalog::CatalogClient;
use crate::paging::PageCursor;
use crate::session::SessionCoordinator;

/// A paged trending list for one media kind.
///
/// Unlike the discovery pipeline this is driven directly by its owner; each
/// call runs to completion before the next one can start, so the cursor is
/// the only admission control needed.
pub struct TrendingFeed {
    client: Arc<dyn CatalogClient>,
    session: SessionCoordinator,
    kind: MediaKind,
    prefetch_threshold: usize,
    cursor: PageCursor,
    items: Vec<MediaListItem>,
    error: Option<String>,
}

impl std::fmt::Debug for TrendingFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendingFeed")
            .field("kind", &self.kind)
            .field("cursor", &self.cursor)
            .field("items", &self.items.len())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl TrendingFeed {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        session: SessionCoordinator,
        kind: MediaKind,
        prefetch_threshold: usize,
    ) -> Self {
        Self {
            client,
            session,
            kind,
            prefetch_threshold,
            cursor: PageCursor::new(),
            items: Vec::new(),
            error: None,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn items(&self) -> &[MediaListItem] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Switch kinds. The list starts over.
    pub fn set_kind(&mut self, kind: MediaKind) {
        if kind != self.kind {
            self.kind = kind;
            self.items.clear();
            self.error = None;
            self.cursor.reset();
        }
    }

    /// Drop everything and fetch page 1 again.
    pub async fn refresh(&mut self) -> bool {
        self.cursor.reset();
        self.error = None;
        self.fetch_next().await
    }

    /// Fetch the next page if `visible_index` is within the prefetch
    /// threshold of the loaded end. Returns whether a page was applied.
    pub async fn load_more(&mut self, visible_index: usize) -> bool {
        if visible_index.saturating_add(self.prefetch_threshold) < self.items.len()
        {
            return false;
        }
        self.fetch_next().await
    }

    async fn fetch_next(&mut self) -> bool {
        if !self.session.current().is_authenticated() {
            self.session.ensure_authenticated().await;
            if !self.session.current().is_authenticated() {
                debug!(kind = %self.kind, "trending deferred; not authenticated");
                return false;
            }
        }
        if !self.cursor.begin_loading() {
            return false;
        }

        let page = self.cursor.page();
        match self.client.trending(self.kind, page).await {
            Ok(response) => {
                if page == 1 {
                    self.items = response.results;
                } else {
                    self.items.extend(response.results);
                }
                self.cursor.end_loading(response.total_pages);
                self.error = None;
                true
            }
            Err(err) if err.is_authorization() => {
                self.cursor.cancel_loading();
                self.session.recover_from_auth_failure().await;
                false
            }
            Err(err) => {
                self.cursor.cancel_loading();
                warn!(kind = %self.kind, page, error = %err, "trending fetch failed");
                if page == 1 || self.items.is_empty() {
                    self.error =
                        Some(format!("Connection error: {}", err.user_message()));
                }
                false
            }
        }
    }
}
