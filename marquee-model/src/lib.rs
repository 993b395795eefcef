//! Core data model definitions shared across Marquee crates.
#![allow(missing_docs)]

pub mod error;
pub mod filter;
pub mod ids;
pub mod keyword;
pub mod media;
pub mod media_kind;
pub mod page;
pub mod prelude;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use filter::FilterSnapshot;
pub use ids::{GenreId, KeywordId, MediaId, ProviderId};
pub use keyword::{Keyword, sort_by_name};
pub use media::{MediaListItem, MediaRef};
pub use media_kind::MediaKind;
pub use page::Page;
