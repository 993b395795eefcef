//! The discovery/search pipeline.
//!
//! A single actor task owns the filters, the list cursors and every list the
//! UI renders. [`DiscoveryHandle`] sends it intents; fetches run as spawned
//! tasks that post their results back to the same mailbox, stamped with the
//! [`QueryToken`] of the context they were issued for. Observers read
//! [`DiscoverySnapshot`]s from a `watch` channel.

mod keywords;
mod pipeline;
mod recommendations;
mod state;
mod trending;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use marquee_model::prelude::{GenreId, Keyword, KeywordId, MediaKind, ProviderId};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::catalog::CatalogClient;
use crate::filters::FilterState;
use crate::session::SessionCoordinator;

use pipeline::{Command, Message, Pipeline};

pub use state::{
    DiscoverySnapshot, ListKind, ListSnapshot, QueryMode, QueryToken, Section,
};
pub use trending::TrendingFeed;

/// Tunables for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    /// Quiet period after the last keystroke before a query is dispatched
    pub search_debounce: Duration,
    /// How close to the loaded end a visible row must be to fetch more
    pub prefetch_threshold: usize,
    pub mailbox_capacity: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            prefetch_threshold: 5,
            mailbox_capacity: 256,
        }
    }
}

/// One-off notifications that are not part of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A keyword was activated; the UI should reveal the advanced filters.
    AdvancedViewRequested { keyword: KeywordId },
}

/// Entry point for spawning the pipeline actor.
#[derive(Debug)]
pub struct DiscoveryPipeline;

impl DiscoveryPipeline {
    /// Spawn the actor and load the initial Discover page once the session
    /// is authenticated.
    pub fn spawn(
        client: Arc<dyn CatalogClient>,
        session: SessionCoordinator,
        filters: FilterState,
        settings: DiscoverySettings,
    ) -> DiscoveryHandle {
        let (tx, rx) = mpsc::channel(settings.mailbox_capacity.max(1));
        let initial = DiscoverySnapshot {
            filters: filters.snapshot().clone(),
            ..DiscoverySnapshot::default()
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (events, _) = broadcast::channel(16);
        let shutdown = CancellationToken::new();

        let actor = Pipeline::new(
            client,
            session,
            filters,
            settings,
            tx.downgrade(),
            snapshot_tx,
            events.clone(),
        );
        let task = tokio::spawn(actor.run(rx, shutdown.clone()));

        DiscoveryHandle {
            mailbox: tx,
            snapshots: snapshot_rx,
            events,
            shutdown,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}

/// Cloneable front door to a running pipeline.
///
/// Intents are queued in order. Sending to a pipeline that has shut down is
/// a silent no-op.
#[derive(Clone)]
pub struct DiscoveryHandle {
    mailbox: mpsc::Sender<Message>,
    snapshots: watch::Receiver<DiscoverySnapshot>,
    events: broadcast::Sender<PipelineEvent>,
    shutdown: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl fmt::Debug for DiscoveryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryHandle")
            .field("closed", &self.mailbox.is_closed())
            .field("shutdown_cancelled", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl DiscoveryHandle {
    async fn send(&self, command: Command) -> bool {
        self.mailbox.send(Message::Command(command)).await.is_ok()
    }

    pub fn current(&self) -> DiscoverySnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DiscoverySnapshot> {
        self.snapshots.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Debounced: only the last text within the quiet period is dispatched.
    pub async fn set_search_text(&self, text: impl Into<String>) {
        self.send(Command::SetSearchText(text.into())).await;
    }

    pub async fn set_media_kind(&self, kind: MediaKind) {
        self.send(Command::SetMediaKind(kind)).await;
    }

    pub async fn toggle_provider(&self, id: ProviderId) {
        self.send(Command::ToggleProvider(id)).await;
    }

    pub async fn toggle_genre(&self, id: GenreId) {
        self.send(Command::ToggleGenre(id)).await;
    }

    /// Activate `keyword` as a facet. Clears the query and switches to
    /// Discover mode. Activating an active keyword does nothing.
    pub async fn activate(&self, keyword: Keyword) {
        self.send(Command::ActivateKeyword(keyword)).await;
    }

    pub async fn remove(&self, keyword: KeywordId) {
        self.send(Command::RemoveKeyword(keyword)).await;
    }

    /// Report that row `visible_index` of `list` is on screen.
    pub async fn load_more(&self, list: ListKind, visible_index: usize) {
        self.send(Command::LoadMore {
            list,
            visible_index,
        })
        .await;
    }

    /// Reload the current context from page 1.
    pub async fn refresh(&self) {
        self.send(Command::Refresh).await;
    }

    pub async fn dismiss_error(&self, section: Section) {
        self.send(Command::DismissError(section)).await;
    }

    /// Resolve once every intent sent so far has been handled and the
    /// pipeline is idle: no armed debounce, no session check and no fetch in
    /// flight. Returns immediately if the pipeline is gone.
    pub async fn settled(&self) -> DiscoverySnapshot {
        let (reply, done) = oneshot::channel();
        if self.send(Command::Sync(reply)).await {
            let _ = done.await;
        }
        let mut snapshots = self.snapshots.clone();
        let settled = match snapshots.wait_for(DiscoverySnapshot::is_settled).await
        {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.current(),
        };
        settled
    }

    /// Stop the actor and wait for pending filter writes to flush.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(err) = task.await
        {
            warn!(error = %err, "discovery pipeline task failed");
        }
    }
}
