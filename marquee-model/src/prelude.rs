//! Frequently used model types for the core and presentation layers.

pub use super::filter::FilterSnapshot;
pub use super::ids::{GenreId, KeywordId, MediaId, ProviderId};
pub use super::keyword::Keyword;
pub use super::media::{MediaListItem, MediaRef};
pub use super::media_kind::MediaKind;
pub use super::page::Page;
