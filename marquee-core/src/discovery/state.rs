//! What the pipeline publishes to observers.

use marquee_model::prelude::{FilterSnapshot, Keyword, MediaListItem, MediaRef};

use crate::paging::PageCursor;

/// Which list a `load_more` request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Primary,
    MovieRecommendations,
    TvRecommendations,
}

/// Scope of a dismissible error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Primary,
    Recommendations,
    KeywordSuggestions,
}

/// Whether the primary list comes from facets or from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    Discover,
    Search,
}

/// Identity of a query context. Every context change mints a new token and
/// completions stamped with an older one are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct QueryToken(pub u64);

impl QueryToken {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Items of one list plus its loading flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub has_more: bool,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            has_more: true,
        }
    }
}

/// Immutable view of the pipeline, republished after every change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscoverySnapshot {
    /// The query the primary list was built from (after debouncing)
    pub query: String,
    /// Text typed but not yet dispatched
    pub pending_query: Option<String>,
    pub filters: FilterSnapshot,
    pub primary: ListSnapshot<MediaListItem>,
    pub primary_error: Option<String>,
    /// The title recommendations are seeded from
    pub seed: Option<MediaRef>,
    pub movie_recommendations: ListSnapshot<MediaListItem>,
    pub tv_recommendations: ListSnapshot<MediaListItem>,
    pub recommendations_error: Option<String>,
    pub keyword_suggestions: ListSnapshot<Keyword>,
    pub keywords_error: Option<String>,
    /// Session checks started by the pipeline that have not finished
    pub auth_pending: bool,
}

impl DiscoverySnapshot {
    pub fn mode(&self) -> QueryMode {
        if self.query.is_empty() {
            QueryMode::Discover
        } else {
            QueryMode::Search
        }
    }

    pub fn error(&self, section: Section) -> Option<&str> {
        match section {
            Section::Primary => self.primary_error.as_deref(),
            Section::Recommendations => self.recommendations_error.as_deref(),
            Section::KeywordSuggestions => self.keywords_error.as_deref(),
        }
    }

    /// No debounce armed, no session check and no fetch in flight.
    pub fn is_settled(&self) -> bool {
        self.pending_query.is_none()
            && !self.auth_pending
            && !self.primary.is_loading
            && !self.movie_recommendations.is_loading
            && !self.tv_recommendations.is_loading
            && !self.keyword_suggestions.is_loading
    }
}

/// A paged list owned by the pipeline actor.
#[derive(Debug, Default)]
pub(crate) struct PagedList {
    pub items: Vec<MediaListItem>,
    pub cursor: PageCursor,
}

impl PagedList {
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor.reset();
    }

    /// Page 1 replaces the list, later pages append.
    pub fn apply(&mut self, page: u32, total_pages: u32, results: Vec<MediaListItem>) {
        if page <= 1 {
            self.items = results;
        } else {
            self.items.extend(results);
        }
        self.cursor.end_loading(total_pages);
    }

    /// `visible_index` is close enough to the loaded end to fetch more.
    pub fn wants_more(&self, visible_index: usize, threshold: usize) -> bool {
        visible_index.saturating_add(threshold) >= self.items.len()
    }

    pub fn snapshot(&self) -> ListSnapshot<MediaListItem> {
        ListSnapshot {
            items: self.items.clone(),
            is_loading: self.cursor.is_loading(),
            has_more: self.cursor.has_more(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::prelude::MediaKind;

    fn item(id: u64) -> MediaListItem {
        MediaListItem::new(id, format!("t{id}"), MediaKind::Movie)
    }

    #[test]
    fn first_page_replaces_later_pages_append() {
        let mut list = PagedList::default();
        list.items = vec![item(99)];

        assert!(list.cursor.begin_loading());
        list.apply(1, 3, vec![item(1), item(2)]);
        assert!(list.cursor.begin_loading());
        list.apply(2, 3, vec![item(3)]);

        let ids: Vec<_> = list.items.iter().map(|i| i.id.get()).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(list.cursor.page(), 3);
    }

    #[test]
    fn prefetch_threshold_counts_from_loaded_end() {
        let mut list = PagedList::default();
        list.items = (1..=20).map(item).collect();
        assert!(!list.wants_more(14, 5));
        assert!(list.wants_more(15, 5));
        assert!(list.wants_more(19, 5));
    }

    #[test]
    fn settled_requires_idle_lists_and_no_pending_text() {
        let mut snapshot = DiscoverySnapshot::default();
        assert!(snapshot.is_settled());
        snapshot.pending_query = Some("av".into());
        assert!(!snapshot.is_settled());
        snapshot.pending_query = None;
        snapshot.keyword_suggestions.is_loading = true;
        assert!(!snapshot.is_settled());
    }

    #[test]
    fn empty_query_means_discover() {
        let mut snapshot = DiscoverySnapshot::default();
        assert_eq!(snapshot.mode(), QueryMode::Discover);
        snapshot.query = "heat".into();
        assert_eq!(snapshot.mode(), QueryMode::Search);
    }
}
