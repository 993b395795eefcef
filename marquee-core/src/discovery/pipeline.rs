use std::sync::Arc;

use marquee_model::prelude::{
    GenreId, Keyword, KeywordId, MediaKind, MediaListItem, MediaRef, Page,
    ProviderId,
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::keywords;
use super::recommendations::{self, RecommendationPair};
use super::state::{
    DiscoverySnapshot, ListKind, ListSnapshot, PagedList, QueryMode,
    QueryToken, Section,
};
use super::{DiscoverySettings, PipelineEvent};
use crate::catalog::{CatalogClient, DiscoverQuery};
use crate::error::CatalogResult;
use crate::filters::FilterState;
use crate::session::{AuthState, SessionCoordinator};

/// User intents accepted by the pipeline.
#[derive(Debug)]
pub(crate) enum Command {
    SetSearchText(String),
    SetMediaKind(MediaKind),
    ToggleProvider(ProviderId),
    ToggleGenre(GenreId),
    ActivateKeyword(Keyword),
    RemoveKeyword(KeywordId),
    LoadMore { list: ListKind, visible_index: usize },
    Refresh,
    DismissError(Section),
    /// Answered once every earlier message has been handled
    Sync(oneshot::Sender<()>),
}

/// Results posted back by spawned fetches.
#[derive(Debug)]
pub(crate) enum Completion {
    Primary {
        token: QueryToken,
        page: u32,
        result: CatalogResult<Page<MediaListItem>>,
    },
    Keywords {
        token: QueryToken,
        result: CatalogResult<Vec<Keyword>>,
    },
    Recommendations {
        token: QueryToken,
        pair: RecommendationPair,
    },
    RecommendationPage {
        token: QueryToken,
        kind: MediaKind,
        page: u32,
        result: CatalogResult<Page<MediaListItem>>,
    },
    AuthSettled,
}

#[derive(Debug)]
pub(crate) enum Message {
    Command(Command),
    Completion(Completion),
}

/// The actor. Owns every piece of discovery state; nothing here is shared.
pub(crate) struct Pipeline {
    client: Arc<dyn CatalogClient>,
    session: SessionCoordinator,
    settings: DiscoverySettings,
    filters: FilterState,

    query: String,
    pending_query: Option<String>,
    debounce_deadline: Option<Instant>,
    token: QueryToken,

    primary: PagedList,
    primary_error: Option<String>,
    seed: Option<MediaRef>,
    movie_recs: PagedList,
    tv_recs: PagedList,
    recommendations_error: Option<String>,
    keyword_suggestions: Vec<Keyword>,
    keywords_loading: bool,
    keywords_error: Option<String>,

    reload_pending: bool,
    /// A rejected first page already scheduled one automatic reload
    retried_after_rejection: bool,
    auth_tasks: usize,

    mailbox: mpsc::WeakSender<Message>,
    snapshots: watch::Sender<DiscoverySnapshot>,
    events: broadcast::Sender<PipelineEvent>,
}

impl Pipeline {
    pub(crate) fn new(
        client: Arc<dyn CatalogClient>,
        session: SessionCoordinator,
        filters: FilterState,
        settings: DiscoverySettings,
        mailbox: mpsc::WeakSender<Message>,
        snapshots: watch::Sender<DiscoverySnapshot>,
        events: broadcast::Sender<PipelineEvent>,
    ) -> Self {
        Self {
            client,
            session,
            settings,
            filters,
            query: String::new(),
            pending_query: None,
            debounce_deadline: None,
            token: QueryToken::default(),
            primary: PagedList::default(),
            primary_error: None,
            seed: None,
            movie_recs: PagedList::default(),
            tv_recs: PagedList::default(),
            recommendations_error: None,
            keyword_suggestions: Vec::new(),
            keywords_loading: false,
            keywords_error: None,
            reload_pending: false,
            retried_after_rejection: false,
            auth_tasks: 0,
            mailbox,
            snapshots,
            events,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut inbox: mpsc::Receiver<Message>,
        shutdown: CancellationToken,
    ) {
        let mut auth_rx = self.session.subscribe();
        auth_rx.borrow_and_update();

        let debounce = tokio::time::sleep(self.settings.search_debounce);
        tokio::pin!(debounce);

        self.reload();

        loop {
            self.publish();
            if let Some(deadline) = self.debounce_deadline {
                debounce.as_mut().reset(deadline);
            }

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("discovery pipeline shutting down");
                    break;
                }
                // Ahead of the inbox so a `Sync` never overtakes a state
                // change that was already published.
                Ok(()) = auth_rx.changed() => {
                    let state = auth_rx.borrow_and_update().clone();
                    if state == AuthState::Unauthenticated {
                        self.session_lost();
                    }
                    // Our own checks report through `AuthSettled`; reacting
                    // earlier could act on an optimistic guess.
                    if self.auth_tasks == 0 {
                        self.resume_if_authenticated();
                    }
                }
                message = inbox.recv() => match message {
                    Some(Message::Command(command)) => self.handle_command(command),
                    Some(Message::Completion(completion)) => {
                        self.handle_completion(completion)
                    }
                    None => {
                        debug!("discovery mailbox closed");
                        break;
                    }
                },
                () = &mut debounce, if self.debounce_deadline.is_some() => {
                    self.debounce_deadline = None;
                    if let Some(text) = self.pending_query.take() {
                        self.commit_query(text);
                    }
                }
            }
        }

        self.filters.close().await;
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetSearchText(text) => {
                self.pending_query = Some(text);
                self.debounce_deadline =
                    Some(Instant::now() + self.settings.search_debounce);
            }
            Command::SetMediaKind(kind) => {
                let changed = self.filters.set_media_kind(kind);
                self.facets_changed(changed);
            }
            Command::ToggleProvider(id) => {
                let changed = self.filters.toggle_provider(id);
                self.facets_changed(changed);
            }
            Command::ToggleGenre(id) => {
                let changed = self.filters.toggle_genre(id);
                self.facets_changed(changed);
            }
            Command::ActivateKeyword(keyword) => self.activate(keyword),
            Command::RemoveKeyword(id) => self.remove(id),
            Command::LoadMore {
                list,
                visible_index,
            } => self.load_more(list, visible_index),
            Command::Refresh => {
                self.retried_after_rejection = false;
                self.primary_error = None;
                self.recommendations_error = None;
                self.keywords_error = None;
                self.reload();
            }
            Command::DismissError(section) => match section {
                Section::Primary => self.primary_error = None,
                Section::Recommendations => self.recommendations_error = None,
                Section::KeywordSuggestions => self.keywords_error = None,
            },
            Command::Sync(reply) => {
                self.publish();
                let _ = reply.send(());
            }
        }
    }

    fn mode(&self) -> QueryMode {
        if self.query.is_empty() {
            QueryMode::Discover
        } else {
            QueryMode::Search
        }
    }

    /// The debounce fired for `text`.
    fn commit_query(&mut self, text: String) {
        let text = text.trim().to_string();
        if text == self.query {
            return;
        }
        debug!(query = %text, "query committed");
        self.query = text;
        self.clear_search_derived();
        self.primary.items.clear();
        self.primary_error = None;
        self.reload();
    }

    fn facets_changed(&mut self, changed: bool) {
        // In search mode the facets are only remembered for later
        if changed && self.mode() == QueryMode::Discover {
            self.reload();
        }
    }

    fn activate(&mut self, keyword: Keyword) {
        if self.filters.is_keyword_active(keyword.id) {
            return;
        }
        let id = keyword.id;
        self.pending_query = None;
        self.debounce_deadline = None;
        self.query.clear();
        self.filters.insert_keyword(keyword);

        self.clear_search_derived();
        self.primary.items.clear();
        self.primary_error = None;
        let _ = self
            .events
            .send(PipelineEvent::AdvancedViewRequested { keyword: id });
        self.reload();
    }

    fn remove(&mut self, id: KeywordId) {
        if self.filters.remove_keyword(id) && self.mode() == QueryMode::Discover
        {
            self.reload();
        }
    }

    fn clear_search_derived(&mut self) {
        self.clear_recommendations();
        self.keyword_suggestions.clear();
        self.keywords_loading = false;
        self.keywords_error = None;
    }

    fn clear_recommendations(&mut self) {
        self.seed = None;
        self.movie_recs.clear();
        self.tv_recs.clear();
        self.recommendations_error = None;
    }

    /// Start over on page 1 of the current context. Everything in flight
    /// belongs to the previous token and will be dropped on arrival.
    fn reload(&mut self) {
        self.token = self.token.next();
        self.primary.cursor.reset();
        if self.mode() == QueryMode::Search {
            self.movie_recs.cursor.reset();
            self.tv_recs.cursor.reset();
            self.keywords_loading = false;
        }
        if !self.authorized() {
            self.reload_pending = true;
            return;
        }
        self.reload_pending = false;
        self.fetch_primary();
    }

    /// Whether loads may be dispatched right now. When they may not, a
    /// session check is started.
    fn authorized(&mut self) -> bool {
        if self.session.current().is_authenticated() {
            return true;
        }
        debug!("load deferred until the session is authenticated");
        let session = self.session.clone();
        self.spawn_auth_task(async move { session.ensure_authenticated().await });
        false
    }

    /// The catalog said the session is gone. The rejection retry budget
    /// only guards against a session that claims to be valid, so a later
    /// sign-in starts afresh and reloads an empty list.
    fn session_lost(&mut self) {
        self.retried_after_rejection = false;
        if self.primary.items.is_empty() && !self.primary.cursor.is_loading() {
            self.reload_pending = true;
        }
    }

    fn resume_if_authenticated(&mut self) {
        if self.reload_pending && self.session.current().is_authenticated() {
            info!("session authenticated; reloading");
            self.reload();
        }
    }

    fn load_more(&mut self, list: ListKind, visible_index: usize) {
        let threshold = self.settings.prefetch_threshold;
        let wants_more = match list {
            ListKind::Primary => self.primary.wants_more(visible_index, threshold),
            ListKind::MovieRecommendations => {
                self.movie_recs.wants_more(visible_index, threshold)
            }
            ListKind::TvRecommendations => {
                self.tv_recs.wants_more(visible_index, threshold)
            }
        };
        if !wants_more || !self.authorized() {
            return;
        }

        match list {
            ListKind::Primary => self.fetch_primary(),
            ListKind::MovieRecommendations => {
                self.fetch_recommendation_page(MediaKind::Movie)
            }
            ListKind::TvRecommendations => {
                self.fetch_recommendation_page(MediaKind::Tv)
            }
        }
    }

    fn fetch_primary(&mut self) {
        if !self.primary.cursor.begin_loading() {
            return;
        }
        let token = self.token;
        let page = self.primary.cursor.page();
        let client = Arc::clone(&self.client);
        let request = match self.mode() {
            QueryMode::Search => PrimaryRequest::Search(self.query.clone()),
            QueryMode::Discover => PrimaryRequest::Discover(
                DiscoverQuery::from_filters(self.filters.snapshot()),
            ),
        };
        debug!(token = token.0, page, ?request, "primary fetch");

        self.spawn_fetch(async move {
            let result = match &request {
                PrimaryRequest::Search(query) => client.search(query, page).await,
                PrimaryRequest::Discover(query) => {
                    client.discover(query, page).await
                }
            };
            Completion::Primary {
                token,
                page,
                result,
            }
        });
    }

    fn fetch_recommendation_page(&mut self, kind: MediaKind) {
        let Some(seed) = self.seed else {
            return;
        };
        let list = match kind {
            MediaKind::Movie => &mut self.movie_recs,
            MediaKind::Tv => &mut self.tv_recs,
        };
        if !list.cursor.begin_loading() {
            return;
        }
        let token = self.token;
        let page = list.cursor.page();
        let client = Arc::clone(&self.client);
        debug!(token = token.0, page, %kind, "recommendation fetch");

        self.spawn_fetch(async move {
            let result = client.recommendations(seed, kind, page).await;
            Completion::RecommendationPage {
                token,
                kind,
                page,
                result,
            }
        });
    }

    /// Search page 1 landed: fetch what depends on it.
    fn start_follow_ups(&mut self) {
        let token = self.token;

        self.keywords_loading = true;
        let client = Arc::clone(&self.client);
        let session = self.session.clone();
        let query = self.query.clone();
        self.spawn_fetch(async move {
            let result =
                keywords::usable_keywords(client.as_ref(), &session, &query)
                    .await;
            Completion::Keywords { token, result }
        });

        let Some(seed) = self.primary.items.first().map(MediaListItem::media_ref)
        else {
            // No hits: nothing to seed from, drop what an earlier seed left
            self.clear_recommendations();
            return;
        };
        if !self.movie_recs.cursor.begin_loading() {
            return;
        }
        if !self.tv_recs.cursor.begin_loading() {
            self.movie_recs.cursor.cancel_loading();
            return;
        }
        self.seed = Some(seed);
        let client = Arc::clone(&self.client);
        let session = self.session.clone();
        self.spawn_fetch(async move {
            let pair = recommendations::fetch_first_pages(
                client.as_ref(),
                &session,
                seed,
            )
            .await;
            Completion::Recommendations { token, pair }
        });
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Primary {
                token,
                page,
                result,
            } => {
                if self.is_stale(token, "primary") {
                    return;
                }
                self.apply_primary(page, result);
            }
            Completion::Keywords { token, result } => {
                if self.is_stale(token, "keywords") {
                    return;
                }
                self.keywords_loading = false;
                match result {
                    Ok(usable) => {
                        self.keyword_suggestions = usable;
                        self.keywords_error = None;
                    }
                    Err(err) => {
                        warn!(error = %err, "keyword suggestions failed");
                        self.keywords_error = keywords::error_message(&err);
                    }
                }
            }
            Completion::Recommendations { token, pair } => {
                if self.is_stale(token, "recommendations") {
                    return;
                }
                self.recommendations_error = pair.error_message();
                let RecommendationPair { movies, tv } = pair;
                apply_first_page(&mut self.movie_recs, movies);
                apply_first_page(&mut self.tv_recs, tv);
            }
            Completion::RecommendationPage {
                token,
                kind,
                page,
                result,
            } => {
                if self.is_stale(token, "recommendations") {
                    return;
                }
                self.apply_recommendation_page(kind, page, result);
            }
            Completion::AuthSettled => {
                self.auth_tasks = self.auth_tasks.saturating_sub(1);
                if self.session.current() == AuthState::Unauthenticated {
                    self.session_lost();
                }
                if self.auth_tasks == 0 {
                    self.resume_if_authenticated();
                }
            }
        }
    }

    fn is_stale(&self, token: QueryToken, list: &'static str) -> bool {
        let stale = token != self.token;
        if stale {
            debug!(
                token = token.0,
                current = self.token.0,
                list,
                "dropping stale response"
            );
        }
        stale
    }

    fn apply_primary(
        &mut self,
        page: u32,
        result: CatalogResult<Page<MediaListItem>>,
    ) {
        match result {
            Ok(response) => {
                debug!(page, results = response.results.len(), "primary page");
                self.primary
                    .apply(page, response.total_pages, response.results);
                self.primary_error = None;
                self.retried_after_rejection = false;
                if page == 1 && self.mode() == QueryMode::Search {
                    self.start_follow_ups();
                }
            }
            Err(err) if err.is_authorization() => {
                self.primary.cursor.cancel_loading();
                if page == 1 && !self.retried_after_rejection {
                    self.retried_after_rejection = true;
                    self.reload_pending = true;
                }
                self.recover_session();
            }
            Err(err) => {
                self.primary.cursor.cancel_loading();
                warn!(page, error = %err, "primary fetch failed");
                if page == 1 || self.primary.items.is_empty() {
                    self.primary_error =
                        Some(format!("Connection error: {}", err.user_message()));
                }
            }
        }
    }

    fn apply_recommendation_page(
        &mut self,
        kind: MediaKind,
        page: u32,
        result: CatalogResult<Page<MediaListItem>>,
    ) {
        let list = match kind {
            MediaKind::Movie => &mut self.movie_recs,
            MediaKind::Tv => &mut self.tv_recs,
        };
        match result {
            Ok(response) => {
                list.apply(page, response.total_pages, response.results)
            }
            Err(err) => {
                list.cursor.cancel_loading();
                if err.is_authorization() {
                    self.recover_session();
                } else if page == 1 || list.items.is_empty() {
                    self.recommendations_error =
                        Some(recommendations::page_error_message(kind, &err));
                } else {
                    warn!(%kind, page, error = %err, "recommendation page failed");
                }
            }
        }
    }

    fn recover_session(&mut self) {
        let session = self.session.clone();
        self.spawn_auth_task(async move {
            session.recover_from_auth_failure().await
        });
    }

    fn spawn_fetch<F>(&self, fetch: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let Some(mailbox) = self.mailbox.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let completion = fetch.await;
            // The actor may be gone; nothing left to update then
            let _ = mailbox.send(Message::Completion(completion)).await;
        });
    }

    fn spawn_auth_task<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.auth_tasks += 1;
        self.spawn_fetch(async move {
            task.await;
            Completion::AuthSettled
        });
    }

    fn snapshot(&self) -> DiscoverySnapshot {
        DiscoverySnapshot {
            query: self.query.clone(),
            pending_query: self.pending_query.clone(),
            filters: self.filters.snapshot().clone(),
            primary: self.primary.snapshot(),
            primary_error: self.primary_error.clone(),
            seed: self.seed,
            movie_recommendations: self.movie_recs.snapshot(),
            tv_recommendations: self.tv_recs.snapshot(),
            recommendations_error: self.recommendations_error.clone(),
            keyword_suggestions: ListSnapshot {
                items: self.keyword_suggestions.clone(),
                is_loading: self.keywords_loading,
                has_more: false,
            },
            keywords_error: self.keywords_error.clone(),
            auth_pending: self.auth_tasks > 0,
        }
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

#[derive(Debug)]
enum PrimaryRequest {
    Search(String),
    Discover(DiscoverQuery),
}

fn apply_first_page(
    list: &mut PagedList,
    result: CatalogResult<Page<MediaListItem>>,
) {
    match result {
        Ok(response) => list.apply(1, response.total_pages, response.results),
        Err(err) => {
            debug!(error = %err, "recommendations unavailable");
            list.cursor.cancel_loading();
        }
    }
}
