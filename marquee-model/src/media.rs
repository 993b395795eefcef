use crate::ids::MediaId;
use crate::media_kind::MediaKind;

/// Normalized projection of a catalog title, shared by search results,
/// discover results, recommendations and trending feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaListItem {
    pub id: MediaId,
    pub title: String,
    /// Opaque poster reference (a path the image layer resolves).
    pub poster_ref: Option<String>,
    pub media_kind: MediaKind,
}

impl MediaListItem {
    pub fn new(
        id: impl Into<MediaId>,
        title: impl Into<String>,
        media_kind: MediaKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            poster_ref: None,
            media_kind,
        }
    }

    pub fn with_poster(mut self, poster_ref: impl Into<String>) -> Self {
        self.poster_ref = Some(poster_ref.into());
        self
    }

    /// Identity of this title, usable as a recommendation seed.
    pub fn media_ref(&self) -> MediaRef {
        MediaRef {
            id: self.id,
            kind: self.media_kind,
        }
    }
}

/// Kind-qualified reference to a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaRef {
    pub id: MediaId,
    pub kind: MediaKind,
}
