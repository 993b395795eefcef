//! Test doubles shared by unit tests, integration tests and demos.

mod stub_catalog;

pub use stub_catalog::{CatalogCall, StubCatalog};

use marquee_model::prelude::{MediaKind, MediaListItem, Page};

/// A single-page result of titles named after their ids.
pub fn titles(kind: MediaKind, ids: &[u64]) -> Page<MediaListItem> {
    Page::single(
        ids.iter()
            .map(|&id| MediaListItem::new(id, format!("{kind} {id}"), kind))
            .collect(),
    )
}

/// Page `page` of `total_pages`, `per_page` titles each, with ids that are
/// unique across pages.
pub fn numbered_page(
    kind: MediaKind,
    page: u32,
    total_pages: u32,
    per_page: u64,
) -> Page<MediaListItem> {
    let first = u64::from(page - 1) * per_page + 1;
    let ids: Vec<u64> = (first..first + per_page).collect();
    Page::numbered(page, total_pages, titles(kind, &ids).results)
}
