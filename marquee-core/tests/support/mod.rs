#![allow(dead_code)]

use std::sync::Arc;

use marquee_core::catalog::CatalogClient;
use marquee_core::discovery::{
    DiscoveryHandle, DiscoveryPipeline, DiscoverySettings, DiscoverySnapshot,
};
use marquee_core::filters::FilterState;
use marquee_core::session::{SessionCoordinator, SessionSettings};
use marquee_core::testing::StubCatalog;
use marquee_model::prelude::{MediaKind, MediaListItem};

pub struct Harness {
    pub stub: StubCatalog,
    pub session: SessionCoordinator,
    pub pipeline: DiscoveryHandle,
}

impl Harness {
    /// Spawn a pipeline over `stub` and wait for the initial load.
    pub async fn start(stub: StubCatalog) -> Self {
        Self::start_with(stub, FilterState::default()).await
    }

    pub async fn start_with(stub: StubCatalog, filters: FilterState) -> Self {
        let client: Arc<dyn CatalogClient> = Arc::new(stub.clone());
        let session = SessionCoordinator::with_client(
            SessionSettings::default(),
            Arc::clone(&client),
        );
        let pipeline = DiscoveryPipeline::spawn(
            client,
            session.clone(),
            filters,
            DiscoverySettings::default(),
        );
        pipeline.settled().await;
        Self {
            stub,
            session,
            pipeline,
        }
    }

    pub async fn settled(&self) -> DiscoverySnapshot {
        self.pipeline.settled().await
    }
}

pub fn ids(items: &[MediaListItem]) -> Vec<u64> {
    items.iter().map(|item| item.id.get()).collect()
}

pub fn movie(id: u64, title: &str) -> MediaListItem {
    MediaListItem::new(id, title, MediaKind::Movie)
}
