mod support;

use std::time::Duration;

use marquee_core::CatalogError;
use marquee_core::discovery::{ListKind, QueryMode, Section};
use marquee_core::testing::{CatalogCall, StubCatalog, titles};
use marquee_model::prelude::{MediaKind, Page};
use support::{Harness, ids, movie};

fn sleep(ms: u64) -> tokio::time::Sleep {
    tokio::time::sleep(Duration::from_millis(ms))
}

#[tokio::test(start_paused = true)]
async fn rapid_typing_dispatches_only_the_last_query() {
    let stub = StubCatalog::new();
    stub.on_search(|_, _| Ok(titles(MediaKind::Movie, &[299_536])));
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("a").await;
    sleep(100).await;
    h.pipeline.set_search_text("av").await;
    sleep(100).await;
    h.pipeline.set_search_text("avengers").await;
    let snapshot = h.settled().await;

    assert_eq!(h.stub.searches(), ["avengers"]);
    assert_eq!(snapshot.query, "avengers");
    assert_eq!(snapshot.mode(), QueryMode::Search);
    assert_eq!(ids(&snapshot.primary.items), [299_536]);
}

#[tokio::test(start_paused = true)]
async fn late_response_for_old_query_is_dropped() {
    let stub = StubCatalog::new();
    stub.on_search(|query, _| match query {
        "old" => Ok(Page::single(vec![movie(1, "Old")])),
        _ => Ok(Page::single(vec![movie(2, "New")])),
    })
    .with_latency(|call| match call {
        CatalogCall::Search { query, .. } if query == "old" => {
            Some(Duration::from_secs(2))
        }
        _ => None,
    });
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("old").await;
    // let the debounce fire so "old" is in flight
    sleep(400).await;
    h.pipeline.set_search_text("new").await;
    let snapshot = h.settled().await;
    assert_eq!(ids(&snapshot.primary.items), [2]);

    // "old" lands long after "new"
    sleep(3_000).await;
    let snapshot = h.settled().await;

    assert_eq!(h.stub.searches(), ["old", "new"]);
    assert_eq!(ids(&snapshot.primary.items), [2]);
    assert!(!snapshot.primary.is_loading);
}

#[tokio::test(start_paused = true)]
async fn search_success_fetches_suggestions_and_recommendations() {
    let stub = StubCatalog::new();
    stub.on_search(|_, _| Ok(titles(MediaKind::Movie, &[550])))
        .on_recommendations(|seed, kind, _| {
            assert_eq!(seed.id.get(), 550);
            Ok(titles(kind, &[10, 11]))
        });
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("fight club").await;
    let snapshot = h.settled().await;

    assert_eq!(snapshot.seed.map(|seed| seed.id.get()), Some(550));
    assert_eq!(ids(&snapshot.movie_recommendations.items), [10, 11]);
    assert_eq!(ids(&snapshot.tv_recommendations.items), [10, 11]);
    assert_eq!(snapshot.tv_recommendations.items[0].media_kind, MediaKind::Tv);
    assert_eq!(
        h.stub
            .count(|call| matches!(call, CatalogCall::KeywordSearch { .. })),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn one_failed_recommendation_list_names_only_that_kind() {
    let stub = StubCatalog::new();
    stub.on_search(|_, _| Ok(titles(MediaKind::Movie, &[550])))
        .on_recommendations(|_, kind, _| match kind {
            MediaKind::Movie => Err(CatalogError::Transport("timed out".into())),
            MediaKind::Tv => Ok(titles(MediaKind::Tv, &[1, 2, 3])),
        });
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("fight club").await;
    let snapshot = h.settled().await;

    let error = snapshot
        .error(Section::Recommendations)
        .expect("recommendation error");
    assert!(error.contains("movie"));
    assert!(!error.contains("TV"));
    assert_eq!(ids(&snapshot.tv_recommendations.items), [1, 2, 3]);
    assert!(snapshot.movie_recommendations.items.is_empty());

    h.pipeline.dismiss_error(Section::Recommendations).await;
    let snapshot = h.settled().await;
    assert_eq!(snapshot.error(Section::Recommendations), None);
}

#[tokio::test(start_paused = true)]
async fn both_recommendation_failures_combine() {
    let stub = StubCatalog::new();
    stub.on_search(|_, _| Ok(titles(MediaKind::Movie, &[550])))
        .on_recommendations(|_, _, _| {
            Err(CatalogError::Transport("offline".into()))
        });
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("fight club").await;
    let snapshot = h.settled().await;

    assert_eq!(
        snapshot.error(Section::Recommendations),
        Some("Couldn't load recommendations: movies (offline); TV (offline)")
    );
}

#[tokio::test(start_paused = true)]
async fn clearing_the_query_returns_to_discover() {
    let stub = StubCatalog::new();
    stub.on_search(|_, _| Ok(titles(MediaKind::Movie, &[550])))
        .on_discover(|query, _| Ok(titles(query.media_kind, &[7])));
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("fight club").await;
    h.settled().await;
    h.stub.clear_calls();

    h.pipeline.set_search_text("").await;
    let snapshot = h.settled().await;

    assert_eq!(snapshot.mode(), QueryMode::Discover);
    assert_eq!(ids(&snapshot.primary.items), [7]);
    assert!(snapshot.seed.is_none());
    assert!(snapshot.keyword_suggestions.items.is_empty());
    assert!(snapshot.movie_recommendations.items.is_empty());
    assert_eq!(h.stub.discovers().len(), 1);
    assert!(h.stub.searches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn facet_changes_in_search_mode_only_persist() {
    let stub = StubCatalog::new();
    stub.on_search(|_, _| Ok(titles(MediaKind::Movie, &[550])));
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("fight club").await;
    h.settled().await;
    h.stub.clear_calls();

    h.pipeline.set_media_kind(MediaKind::Tv).await;
    let snapshot = h.settled().await;

    assert!(h.stub.calls().is_empty());
    assert_eq!(snapshot.filters.selected_media_kind, MediaKind::Tv);

    h.pipeline.set_search_text("").await;
    h.settled().await;
    let discovers = h.stub.discovers();
    assert_eq!(discovers.len(), 1);
    assert_eq!(discovers[0].0.media_kind, MediaKind::Tv);
}

#[tokio::test(start_paused = true)]
async fn search_results_page_like_discover() {
    let stub = StubCatalog::new();
    stub.on_search(|_, page| {
        Ok(marquee_core::testing::numbered_page(MediaKind::Movie, page, 2, 10))
    });
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("star").await;
    h.settled().await;
    h.pipeline.load_more(ListKind::Primary, 8).await;
    let snapshot = h.settled().await;

    assert_eq!(snapshot.primary.items.len(), 20);
    assert!(!snapshot.primary.has_more);
    assert_eq!(h.stub.searches(), ["star", "star"]);
}

#[tokio::test(start_paused = true)]
async fn refresh_without_hits_drops_old_recommendations() {
    let stub = StubCatalog::new();
    stub.on_search(|_, _| Ok(titles(MediaKind::Movie, &[550])))
        .on_recommendations(|_, kind, _| Ok(titles(kind, &[10, 11])));
    let h = Harness::start(stub).await;

    h.pipeline.set_search_text("fight club").await;
    let snapshot = h.settled().await;
    assert!(snapshot.seed.is_some());
    assert_eq!(ids(&snapshot.movie_recommendations.items), [10, 11]);

    h.stub.on_search(|_, _| Ok(Page::empty()));
    h.pipeline.refresh().await;
    let snapshot = h.settled().await;

    assert!(snapshot.primary.items.is_empty());
    assert!(snapshot.seed.is_none());
    assert!(snapshot.movie_recommendations.items.is_empty());
    assert!(snapshot.tv_recommendations.items.is_empty());
    assert_eq!(snapshot.error(Section::Recommendations), None);
    assert_eq!(h.stub.searches(), ["fight club", "fight club"]);
}
