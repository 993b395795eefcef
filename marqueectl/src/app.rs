use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use marquee_config::Config;
use marquee_core::catalog::{CatalogClient, HttpCatalogClient};
use marquee_core::discovery::{
    DiscoveryHandle, DiscoveryPipeline, DiscoverySnapshot, ListKind,
    TrendingFeed,
};
use marquee_core::filters::{FilterState, JsonFileFilterStore};
use marquee_core::session::SessionCoordinator;
use marquee_model::{Keyword, MediaKind};
use tracing::{debug, info};

use crate::cli::DiscoverArgs;
use crate::render;

/// A configured client, session and filter store for one invocation.
pub struct App {
    config: Config,
    client: Arc<HttpCatalogClient>,
    session: SessionCoordinator,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("base_url", &self.config.catalog.base_url)
            .field("session", &self.session.current())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build the HTTP client, seed the cookie jar and run the first session
    /// probe.
    pub async fn connect(config: Config, cookie: Option<&str>) -> Result<Self> {
        let settings = config.http_settings()?;
        let client = Arc::new(
            HttpCatalogClient::new(settings)
                .context("failed to build catalog client")?,
        );
        if let Some(cookie) = cookie {
            client.restore_cookie(cookie);
            debug!("seeded session cookie");
        }

        let session = SessionCoordinator::new(config.session_settings());
        session
            .configure(client.clone())
            .await
            .await
            .context("session probe task failed")?;

        Ok(Self {
            config,
            client,
            session,
        })
    }

    fn catalog(&self) -> Arc<dyn CatalogClient> {
        self.client.clone()
    }

    fn require_session(&self) -> Result<()> {
        if !self.session.current().is_authenticated() {
            bail!(
                "not signed in to {} (pass --cookie or set MARQUEE_COOKIE)",
                self.config.catalog.base_url
            );
        }
        Ok(())
    }

    async fn filters(&self) -> Result<FilterState> {
        let identity = self.config.service_identity()?;
        let store = Arc::new(JsonFileFilterStore::new(
            self.config.storage.state_dir.clone(),
        ));
        Ok(FilterState::restore(
            store,
            &identity,
            self.config.discovery.persist_coalesce,
        )
        .await)
    }

    async fn pipeline(&self, filters: FilterState) -> DiscoveryHandle {
        let handle = DiscoveryPipeline::spawn(
            self.catalog(),
            self.session.clone(),
            filters,
            self.config.discovery_settings(),
        );
        handle.settled().await;
        handle
    }

    pub fn status(&self) -> String {
        let state = self.session.current();
        let cookie_name = &self.config.session.cookie_name;
        let cookie = match self.client.session_cookie(cookie_name) {
            Some(_) => format!("cookie {cookie_name:?} present"),
            None => format!("no {cookie_name:?} cookie"),
        };
        format!(
            "{}: {} ({cookie})",
            self.config.catalog.base_url,
            render::auth_state(&state)
        )
    }

    pub async fn search(&self, query: &str, pages: u32) -> Result<String> {
        self.require_session()?;
        let handle = self.pipeline(self.filters().await?).await;
        handle.set_search_text(query).await;
        handle.settled().await;
        let snapshot = fetch_pages(&handle, pages).await;
        handle.shutdown().await;
        Ok(render::snapshot(&snapshot, true))
    }

    pub async fn discover(&self, args: DiscoverArgs) -> Result<String> {
        self.require_session()?;
        let mut filters = self.filters().await?;
        if args.reset {
            filters.set_provider_ids(BTreeSet::new());
            filters.set_genre_ids(BTreeSet::new());
            filters.set_active_keywords(Vec::new());
        }
        if let Some(kind) = args.kind {
            filters.set_media_kind(kind.into());
        }
        if !args.providers.is_empty() {
            filters.set_provider_ids(
                args.providers.into_iter().map(Into::into).collect(),
            );
        }
        if !args.genres.is_empty() {
            filters
                .set_genre_ids(args.genres.into_iter().map(Into::into).collect());
        }
        for name in &args.keywords {
            let keyword = self.resolve_keyword(name).await?;
            info!(id = %keyword.id, name = %keyword.name, "activating keyword");
            filters.insert_keyword(keyword);
        }

        let handle = self.pipeline(filters).await;
        let snapshot = fetch_pages(&handle, args.pages).await;
        handle.shutdown().await;
        Ok(format!(
            "{}\n\n{}",
            render::filters(&snapshot.filters),
            render::snapshot(&snapshot, false)
        ))
    }

    pub async fn keywords(&self, query: &str) -> Result<String> {
        self.require_session()?;
        let handle = self.pipeline(self.filters().await?).await;
        handle.set_search_text(query).await;
        let snapshot = handle.settled().await;
        handle.shutdown().await;

        let mut out = render::keywords(&snapshot.keyword_suggestions.items);
        if let Some(error) = snapshot.keywords_error {
            out.push_str(&format!("  ! {error}\n"));
        }
        Ok(out)
    }

    pub async fn trending(&self, kind: MediaKind, pages: u32) -> Result<String> {
        self.require_session()?;
        let mut feed = TrendingFeed::new(
            self.catalog(),
            self.session.clone(),
            kind,
            self.config.discovery.prefetch_threshold,
        );
        feed.refresh().await;
        for _ in 1..pages {
            let last = feed.items().len().saturating_sub(1);
            if feed.items().is_empty() || !feed.load_more(last).await {
                break;
            }
        }

        let mut out = render::titles(
            &format!("Trending {kind}"),
            feed.items(),
            feed.has_more(),
        );
        if let Some(error) = feed.error() {
            out.push_str(&format!("  ! {error}\n"));
        }
        Ok(out)
    }

    pub async fn sign_out(&self) -> String {
        self.session.sign_out().await;
        render::auth_state(&self.session.current())
    }

    /// Exact (case-insensitive) name match from keyword search, else the
    /// first suggestion.
    async fn resolve_keyword(&self, name: &str) -> Result<Keyword> {
        let mut found = self
            .client
            .keyword_search(name)
            .await
            .with_context(|| format!("keyword search for {name:?} failed"))?;
        let exact = found
            .iter()
            .position(|keyword| keyword.name.eq_ignore_ascii_case(name));
        match exact {
            Some(idx) => Ok(found.swap_remove(idx)),
            None if !found.is_empty() => Ok(found.swap_remove(0)),
            None => bail!("no keyword matches {name:?}"),
        }
    }
}

/// Keep paging the primary list until `pages` pages are loaded or the list
/// is exhausted.
async fn fetch_pages(handle: &DiscoveryHandle, pages: u32) -> DiscoverySnapshot {
    let mut snapshot = handle.settled().await;
    for _ in 1..pages {
        let loaded = snapshot.primary.items.len();
        if loaded == 0 || !snapshot.primary.has_more {
            break;
        }
        handle.load_more(ListKind::Primary, loaded - 1).await;
        snapshot = handle.settled().await;
        if snapshot.primary.items.len() == loaded {
            break;
        }
    }
    snapshot
}
