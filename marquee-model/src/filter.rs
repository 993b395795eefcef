use std::collections::BTreeSet;

use crate::ids::{GenreId, KeywordId, ProviderId};
use crate::keyword::Keyword;
use crate::media_kind::MediaKind;

/// Persisted form of the user's active query facets.
///
/// Active keywords carry their display names so the keyword chips can be
/// rebuilt without a catalog round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterSnapshot {
    pub selected_media_kind: MediaKind,
    pub selected_provider_ids: BTreeSet<ProviderId>,
    pub selected_genre_ids: BTreeSet<GenreId>,
    pub active_keywords: Vec<Keyword>,
}

impl FilterSnapshot {
    pub fn active_keyword_ids(&self) -> BTreeSet<KeywordId> {
        self.active_keywords.iter().map(|k| k.id).collect()
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: FilterSnapshot =
            serde_json::from_str(r#"{"selected_media_kind":"tv"}"#)
                .expect("valid snapshot");
        assert_eq!(parsed.selected_media_kind, MediaKind::Tv);
        assert!(parsed.selected_provider_ids.is_empty());
        assert!(parsed.active_keywords.is_empty());
    }
}
