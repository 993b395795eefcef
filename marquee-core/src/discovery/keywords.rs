//! Keyword suggestions filtered down to keywords that yield results.

use futures::future::join_all;
use marquee_model::prelude::{Keyword, MediaKind};
use marquee_model::sort_by_name;
use tracing::{debug, warn};

use crate::catalog::{CatalogClient, DiscoverQuery};
use crate::error::{CatalogError, CatalogResult};
use crate::session::SessionCoordinator;

#[derive(Debug, Default, Clone, Copy)]
struct ProbeOutcome {
    usable: bool,
    unauthorized: bool,
}

impl ProbeOutcome {
    fn absorb(&mut self, result: &CatalogResult<bool>) {
        match result {
            Ok(has_results) => self.usable |= *has_results,
            Err(err) if err.is_authorization() => self.unauthorized = true,
            Err(err) => debug!(error = %err, "keyword probe failed"),
        }
    }
}

async fn has_results(
    client: &dyn CatalogClient,
    kind: MediaKind,
    keyword: &Keyword,
) -> CatalogResult<bool> {
    let query = DiscoverQuery::keyword_probe(kind, keyword.id);
    let page = client.discover(&query, 1).await?;
    Ok(page.total_results > 0 || !page.results.is_empty())
}

/// Probe one keyword against both media kinds at once.
async fn probe(client: &dyn CatalogClient, keyword: &Keyword) -> ProbeOutcome {
    let (movies, tv) = tokio::join!(
        has_results(client, MediaKind::Movie, keyword),
        has_results(client, MediaKind::Tv, keyword),
    );
    let mut outcome = ProbeOutcome::default();
    outcome.absorb(&movies);
    outcome.absorb(&tv);
    outcome
}

/// Suggest keywords for `query` and keep those that return at least one
/// movie or TV show.
///
/// Every suggestion is probed concurrently and the survivors are published
/// together, sorted by name. A rejected session anywhere triggers a single
/// recovery; it does not cut the other probes short.
pub(crate) async fn usable_keywords(
    client: &dyn CatalogClient,
    session: &SessionCoordinator,
    query: &str,
) -> CatalogResult<Vec<Keyword>> {
    let suggestions = match client.keyword_search(query).await {
        Ok(suggestions) => suggestions,
        Err(err) => {
            if err.is_authorization() {
                session.recover_from_auth_failure().await;
            }
            return Err(err);
        }
    };

    let outcomes =
        join_all(suggestions.iter().map(|keyword| probe(client, keyword)))
            .await;

    if outcomes.iter().any(|outcome| outcome.unauthorized) {
        warn!(%query, "session rejected while probing keywords");
        session.recover_from_auth_failure().await;
    }

    let mut usable: Vec<Keyword> = suggestions
        .into_iter()
        .zip(outcomes)
        .filter_map(|(keyword, outcome)| outcome.usable.then_some(keyword))
        .collect();
    sort_by_name(&mut usable);

    debug!(%query, usable = usable.len(), "keyword probing finished");
    Ok(usable)
}

/// Message for a failed suggestion fetch, `None` when the failure is handled
/// by session recovery instead.
pub(crate) fn error_message(err: &CatalogError) -> Option<String> {
    (!err.is_authorization()).then(|| {
        format!("Couldn't load keyword suggestions: {}", err.user_message())
    })
}
