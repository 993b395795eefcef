use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use marquee_model::prelude::{Keyword, MediaKind, MediaListItem, MediaRef, Page};
use parking_lot::Mutex;

use crate::catalog::{CatalogClient, DiscoverQuery, SessionCookie};
use crate::error::{CatalogError, CatalogResult};

/// One recorded call against [`StubCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    SessionCheck,
    Search { query: String, page: u32 },
    Discover { query: DiscoverQuery, page: u32 },
    KeywordSearch { query: String },
    Recommendations { seed: MediaRef, kind: MediaKind, page: u32 },
    Trending { kind: MediaKind, page: u32 },
    EndSession,
}

type PageResponder<A> =
    Arc<dyn Fn(A) -> CatalogResult<Page<MediaListItem>> + Send + Sync>;
type KeywordResponder =
    Arc<dyn Fn(&str) -> CatalogResult<Vec<Keyword>> + Send + Sync>;
type LatencyFn = Arc<dyn Fn(&CatalogCall) -> Option<Duration> + Send + Sync>;

struct Inner {
    authenticated: bool,
    session_check_error: Option<CatalogError>,
    cookie: Option<SessionCookie>,
    search: Option<PageResponder<(String, u32)>>,
    discover: Option<PageResponder<(DiscoverQuery, u32)>>,
    keyword_search: Option<KeywordResponder>,
    recommendations: Option<PageResponder<(MediaRef, MediaKind, u32)>>,
    trending: Option<PageResponder<(MediaKind, u32)>>,
    latency: Option<LatencyFn>,
    calls: Vec<CatalogCall>,
}

/// Programmable in-memory catalog.
///
/// Every endpoint answers an empty page unless a responder is installed.
/// Calls are recorded in arrival order before any configured latency is
/// applied, so tests can assert on dispatch as well as on outcomes.
#[derive(Clone)]
pub struct StubCatalog {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for StubCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("StubCatalog")
            .field("authenticated", &inner.authenticated)
            .field("cookie", &inner.cookie)
            .field("calls", &inner.calls.len())
            .finish_non_exhaustive()
    }
}

impl Default for StubCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StubCatalog {
    /// An authenticated catalog with no session cookie and no content.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                authenticated: true,
                session_check_error: None,
                cookie: None,
                search: None,
                discover: None,
                keyword_search: None,
                recommendations: None,
                trending: None,
                latency: None,
                calls: Vec::new(),
            })),
        }
    }

    pub fn set_authenticated(&self, authenticated: bool) -> &Self {
        self.inner.lock().authenticated = authenticated;
        self
    }

    /// Make the session check fail with `error` until cleared with `None`.
    pub fn set_session_check_error(&self, error: Option<CatalogError>) -> &Self {
        self.inner.lock().session_check_error = error;
        self
    }

    pub fn set_cookie(&self, cookie: Option<SessionCookie>) -> &Self {
        self.inner.lock().cookie = cookie;
        self
    }

    pub fn on_search(
        &self,
        f: impl Fn(&str, u32) -> CatalogResult<Page<MediaListItem>>
        + Send
        + Sync
        + 'static,
    ) -> &Self {
        self.inner.lock().search =
            Some(Arc::new(move |(query, page): (String, u32)| f(&query, page)));
        self
    }

    pub fn on_discover(
        &self,
        f: impl Fn(&DiscoverQuery, u32) -> CatalogResult<Page<MediaListItem>>
        + Send
        + Sync
        + 'static,
    ) -> &Self {
        self.inner.lock().discover =
            Some(Arc::new(move |(query, page): (DiscoverQuery, u32)| {
                f(&query, page)
            }));
        self
    }

    pub fn on_keyword_search(
        &self,
        f: impl Fn(&str) -> CatalogResult<Vec<Keyword>> + Send + Sync + 'static,
    ) -> &Self {
        self.inner.lock().keyword_search = Some(Arc::new(f));
        self
    }

    pub fn on_recommendations(
        &self,
        f: impl Fn(MediaRef, MediaKind, u32) -> CatalogResult<Page<MediaListItem>>
        + Send
        + Sync
        + 'static,
    ) -> &Self {
        self.inner.lock().recommendations =
            Some(Arc::new(
            move |(seed, kind, page): (MediaRef, MediaKind, u32)| {
                f(seed, kind, page)
            },
        ));
        self
    }

    pub fn on_trending(
        &self,
        f: impl Fn(MediaKind, u32) -> CatalogResult<Page<MediaListItem>>
        + Send
        + Sync
        + 'static,
    ) -> &Self {
        self.inner.lock().trending =
            Some(Arc::new(move |(kind, page): (MediaKind, u32)| f(kind, page)));
        self
    }

    /// Delay selected calls. Returning `None` answers immediately.
    pub fn with_latency(
        &self,
        f: impl Fn(&CatalogCall) -> Option<Duration> + Send + Sync + 'static,
    ) -> &Self {
        self.inner.lock().latency = Some(Arc::new(f));
        self
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&CatalogCall) -> bool) -> usize {
        self.inner.lock().calls.iter().filter(|call| pred(call)).count()
    }

    pub fn session_checks(&self) -> usize {
        self.count(|call| matches!(call, CatalogCall::SessionCheck))
    }

    /// Queries of every recorded search, in dispatch order.
    pub fn searches(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                CatalogCall::Search { query, .. } => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every recorded discover call, in dispatch order.
    pub fn discovers(&self) -> Vec<(DiscoverQuery, u32)> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                CatalogCall::Discover { query, page } => {
                    Some((query.clone(), *page))
                }
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: CatalogCall) {
        let latency = {
            let mut inner = self.inner.lock();
            let latency = inner.latency.as_ref().and_then(|f| f(&call));
            inner.calls.push(call);
            latency
        };
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CatalogClient for StubCatalog {
    fn session_cookie(&self, name: &str) -> Option<SessionCookie> {
        self.inner
            .lock()
            .cookie
            .clone()
            .filter(|cookie| cookie.name == name)
    }

    async fn is_authenticated(&self) -> CatalogResult<bool> {
        self.record(CatalogCall::SessionCheck).await;
        let inner = self.inner.lock();
        match &inner.session_check_error {
            Some(err) => Err(err.clone()),
            None => Ok(inner.authenticated),
        }
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>> {
        self.record(CatalogCall::Search {
            query: query.to_string(),
            page,
        })
        .await;
        let responder = self.inner.lock().search.clone();
        match responder {
            Some(f) => f((query.to_string(), page)),
            None => Ok(Page::empty()),
        }
    }

    async fn discover(
        &self,
        query: &DiscoverQuery,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>> {
        self.record(CatalogCall::Discover {
            query: query.clone(),
            page,
        })
        .await;
        let responder = self.inner.lock().discover.clone();
        match responder {
            Some(f) => f((query.clone(), page)),
            None => Ok(Page::empty()),
        }
    }

    async fn keyword_search(&self, query: &str) -> CatalogResult<Vec<Keyword>> {
        self.record(CatalogCall::KeywordSearch {
            query: query.to_string(),
        })
        .await;
        let responder = self.inner.lock().keyword_search.clone();
        match responder {
            Some(f) => f(query),
            None => Ok(Vec::new()),
        }
    }

    async fn recommendations(
        &self,
        seed: MediaRef,
        kind: MediaKind,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>> {
        self.record(CatalogCall::Recommendations { seed, kind, page })
            .await;
        let responder = self.inner.lock().recommendations.clone();
        match responder {
            Some(f) => f((seed, kind, page)),
            None => Ok(Page::empty()),
        }
    }

    async fn trending(
        &self,
        kind: MediaKind,
        page: u32,
    ) -> CatalogResult<Page<MediaListItem>> {
        self.record(CatalogCall::Trending { kind, page }).await;
        let responder = self.inner.lock().trending.clone();
        match responder {
            Some(f) => f((kind, page)),
            None => Ok(Page::empty()),
        }
    }

    async fn end_session(&self) -> CatalogResult<()> {
        self.record(CatalogCall::EndSession).await;
        let mut inner = self.inner.lock();
        inner.authenticated = false;
        inner.cookie = None;
        Ok(())
    }
}
