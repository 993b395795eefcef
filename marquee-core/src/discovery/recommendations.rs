//! Paired movie and TV recommendations for a seed title.

use marquee_model::prelude::{MediaKind, MediaListItem, MediaRef, Page};

use crate::catalog::CatalogClient;
use crate::error::{CatalogError, CatalogResult};
use crate::session::SessionCoordinator;

/// Results of the concurrent first-page fetch.
#[derive(Debug)]
pub(crate) struct RecommendationPair {
    pub movies: CatalogResult<Page<MediaListItem>>,
    pub tv: CatalogResult<Page<MediaListItem>>,
}

impl RecommendationPair {
    /// One banner for whatever failed, ignoring rejected sessions.
    pub fn error_message(&self) -> Option<String> {
        let visible = |result: &CatalogResult<Page<MediaListItem>>| {
            result
                .as_ref()
                .err()
                .filter(|err| !err.is_authorization())
                .map(CatalogError::user_message)
        };

        match (visible(&self.movies), visible(&self.tv)) {
            (Some(movies), Some(tv)) => Some(format!(
                "Couldn't load recommendations: movies ({movies}); TV ({tv})"
            )),
            (Some(movies), None) => {
                Some(format!("Couldn't load movie recommendations: {movies}"))
            }
            (None, Some(tv)) => {
                Some(format!("Couldn't load TV recommendations: {tv}"))
            }
            (None, None) => None,
        }
    }

    fn unauthorized(&self) -> bool {
        [&self.movies, &self.tv]
            .into_iter()
            .any(|result| matches!(result, Err(err) if err.is_authorization()))
    }
}

/// Fetch the first page of movie and TV recommendations for `seed`
/// concurrently. A rejected session triggers one recovery.
pub(crate) async fn fetch_first_pages(
    client: &dyn CatalogClient,
    session: &SessionCoordinator,
    seed: MediaRef,
) -> RecommendationPair {
    let (movies, tv) = tokio::join!(
        client.recommendations(seed, MediaKind::Movie, 1),
        client.recommendations(seed, MediaKind::Tv, 1),
    );
    let pair = RecommendationPair { movies, tv };
    if pair.unauthorized() {
        session.recover_from_auth_failure().await;
    }
    pair
}

/// Message for a failed follow-up page of one recommendation list.
pub(crate) fn page_error_message(
    kind: MediaKind,
    err: &CatalogError,
) -> String {
    match kind {
        MediaKind::Movie => {
            format!("Couldn't load movie recommendations: {}", err.user_message())
        }
        MediaKind::Tv => {
            format!("Couldn't load TV recommendations: {}", err.user_message())
        }
    }
}
