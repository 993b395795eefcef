//! Background writer that coalesces bursts of filter changes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use marquee_model::prelude::FilterSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::store::FilterStore;

/// Hands snapshots to a [`FilterStore`] at most once per coalescing window.
///
/// Submissions never block. Only the newest snapshot pending at the end of a
/// window is written. Dropping or [closing](Self::close) the persister
/// flushes whatever is still pending.
pub struct FilterPersister {
    identity: String,
    tx: watch::Sender<Option<FilterSnapshot>>,
    task: JoinHandle<()>,
}

impl fmt::Debug for FilterPersister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterPersister")
            .field("identity", &self.identity)
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}

impl FilterPersister {
    pub fn spawn(
        store: Arc<dyn FilterStore>,
        identity: impl Into<String>,
        window: Duration,
    ) -> Self {
        let identity = identity.into();
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run(store, identity.clone(), window, rx));
        Self { identity, tx, task }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn submit(&self, snapshot: FilterSnapshot) {
        self.tx.send_replace(Some(snapshot));
    }

    /// Flush the pending snapshot and wait for the writer to finish.
    pub async fn close(self) {
        let Self { tx, task, .. } = self;
        drop(tx);
        if let Err(err) = task.await {
            warn!(error = %err, "filter persister task failed");
        }
    }
}

async fn run(
    store: Arc<dyn FilterStore>,
    identity: String,
    window: Duration,
    mut rx: watch::Receiver<Option<FilterSnapshot>>,
) {
    // `changed` still reports an unseen value after the sender is gone, so
    // the final burst is flushed before the loop ends.
    while rx.changed().await.is_ok() {
        tokio::time::sleep(window).await;
        let Some(snapshot) = rx.borrow_and_update().clone() else {
            continue;
        };
        match store.save(&identity, &snapshot).await {
            Ok(()) => debug!(%identity, "filters persisted"),
            Err(err) => warn!(%identity, error = %err, "failed to persist filters"),
        }
    }
}
