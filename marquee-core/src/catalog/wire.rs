//! JSON shapes returned by the catalog and their normalization into model
//! types.

use marquee_model::prelude::{Keyword, MediaKind, MediaListItem, Page};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct WirePage<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

/// A title entry. Movies carry `title`, TV shows carry `name`; multi-search
/// entries also carry `media_type`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireTitle {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
}

impl WireTitle {
    /// Normalize using the entry's own `media_type`, falling back to
    /// `default_kind`. Returns `None` for people and other non-title entries.
    pub fn into_item(self, default_kind: MediaKind) -> Option<MediaListItem> {
        let kind = match self.media_type.as_deref() {
            None => default_kind,
            Some(raw) => raw.parse::<MediaKind>().ok()?,
        };
        let title = self.title.or(self.name).unwrap_or_default();
        Some(MediaListItem {
            id: self.id.into(),
            title,
            poster_ref: self.poster_path.filter(|p| !p.trim().is_empty()),
            media_kind: kind,
        })
    }
}

impl WirePage<WireTitle> {
    pub fn into_page(self, default_kind: MediaKind) -> Page<MediaListItem> {
        Page {
            page: self.page.max(1),
            total_pages: self.total_pages.max(1),
            total_results: self.total_results,
            results: self
                .results
                .into_iter()
                .filter_map(|entry| entry.into_item(default_kind))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireKeyword {
    pub id: u64,
    pub name: String,
}

impl From<WireKeyword> for Keyword {
    fn from(value: WireKeyword) -> Self {
        Keyword::new(value.id, value.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct WireErrorBody {
    #[serde(default)]
    pub status_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchParams<'a> {
    pub query: &'a str,
    pub page: u32,
    pub include_adult: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverParams {
    pub sort_by: &'static str,
    pub include_adult: bool,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_watch_providers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_genres: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_keywords: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationParams {
    pub media_type: &'static str,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageParams {
    pub page: u32,
}

/// Join ids with the catalog's separator. `|` means "any of", `,` means
/// "all of".
pub fn join_ids<I, T>(ids: I, separator: &str) -> Option<String>
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    let joined = ids
        .into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(separator);
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_search_skips_people_and_reads_names() {
        let raw = r#"{
            "page": 1,
            "total_pages": 3,
            "total_results": 55,
            "results": [
                {"id": 1, "title": "Heat", "media_type": "movie", "poster_path": "/heat.jpg"},
                {"id": 2, "name": "Al Pacino", "media_type": "person"},
                {"id": 3, "name": "The Wire", "media_type": "tv", "poster_path": ""}
            ]
        }"#;
        let page: WirePage<WireTitle> =
            serde_json::from_str(raw).expect("valid page");
        let page = page.into_page(MediaKind::Movie);

        assert_eq!(page.total_pages, 3);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].poster_ref.as_deref(), Some("/heat.jpg"));
        assert_eq!(page.results[1].title, "The Wire");
        assert_eq!(page.results[1].media_kind, MediaKind::Tv);
        assert_eq!(page.results[1].poster_ref, None);
    }

    #[test]
    fn missing_envelope_counts_default_to_one_page() {
        let page: WirePage<WireTitle> =
            serde_json::from_str(r#"{"results": []}"#).expect("valid page");
        let page = page.into_page(MediaKind::Tv);
        assert_eq!((page.page, page.total_pages), (1, 1));
    }

    #[test]
    fn join_ids_uses_separator_and_skips_empty() {
        assert_eq!(join_ids([8u32, 337], "|").as_deref(), Some("8|337"));
        assert_eq!(join_ids(Vec::<u32>::new(), ","), None);
    }
}
