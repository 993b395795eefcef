//! Authentication state and its single-writer store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::info;

/// Authentication state machine.
///
/// `Unknown` is both the startup state and the "re-validating" state entered
/// on recovery. A session never goes straight from `Authenticated` to
/// `Unauthenticated`; the store passes through `Unknown` first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Not yet probed, or being re-validated
    #[default]
    Unknown,

    /// The catalog accepts our session
    Authenticated {
        /// Session cookie expiry when the catalog sent one
        expiry: Option<DateTime<Utc>>,
    },

    /// No usable session
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AuthState::Unknown)
    }

    /// Expiry of an authenticated session, if known
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        match self {
            AuthState::Authenticated { expiry } => *expiry,
            _ => None,
        }
    }
}

/// States published when moving from `current` to `next`, in order.
fn transition_path(current: &AuthState, next: AuthState) -> Vec<AuthState> {
    match (current, &next) {
        (a, b) if a == b => Vec::new(),
        (AuthState::Authenticated { .. }, AuthState::Unauthenticated) => {
            vec![AuthState::Unknown, next]
        }
        _ => vec![next],
    }
}

/// Thread-safe auth state store over a watch channel. Reads never block
/// writers; subscribers always observe the latest value.
#[derive(Clone, Debug)]
pub struct AuthStateStore {
    sender: Arc<watch::Sender<AuthState>>,
    receiver: watch::Receiver<AuthState>,
    /// Serializes multi-step publications against each other.
    writer: Arc<Mutex<()>>,
}

impl Default for AuthStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStateStore {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(AuthState::Unknown);
        Self {
            sender: Arc::new(sender),
            receiver,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn current(&self) -> AuthState {
        self.receiver.borrow().clone()
    }

    /// Check if authenticated without cloning
    pub fn is_authenticated(&self) -> bool {
        self.receiver.borrow().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.receiver.clone()
    }

    pub fn stream(&self) -> WatchStream<AuthState> {
        WatchStream::new(self.subscribe())
    }

    /// Publish `next`, inserting `Unknown` on a direct downgrade. Equal
    /// writes notify nobody. Returns whether anything changed.
    pub fn publish(&self, next: AuthState) -> bool {
        let _guard = self.writer.lock();
        let path = transition_path(&self.current(), next);
        let changed = !path.is_empty();
        for state in path {
            let previous = self.sender.send_replace(state.clone());
            info!(from = ?previous, to = ?state, "auth state");
        }
        changed
    }

    /// Flip to `Unknown` unless already there. The check and the write are
    /// one atomic step, so concurrent callers agree on a single winner.
    pub fn begin_revalidation(&self) -> bool {
        let _guard = self.writer.lock();
        self.sender.send_if_modified(|state| {
            if state.is_unknown() {
                false
            } else {
                info!(from = ?state, "auth state re-validating");
                *state = AuthState::Unknown;
                true
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated() -> AuthState {
        AuthState::Authenticated { expiry: None }
    }

    #[test]
    fn downgrade_passes_through_unknown() {
        assert_eq!(
            transition_path(&authenticated(), AuthState::Unauthenticated),
            vec![AuthState::Unknown, AuthState::Unauthenticated]
        );
        assert_eq!(
            transition_path(&AuthState::Unknown, AuthState::Unauthenticated),
            vec![AuthState::Unauthenticated]
        );
        assert!(transition_path(&authenticated(), authenticated()).is_empty());
    }

    #[test]
    fn equal_publish_does_not_notify() {
        let store = AuthStateStore::new();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        assert!(!store.publish(AuthState::Unknown));
        assert!(!rx.has_changed().expect("sender alive"));

        assert!(store.publish(AuthState::Unauthenticated));
        assert!(rx.has_changed().expect("sender alive"));
    }

    #[test]
    fn revalidation_has_one_winner() {
        let store = AuthStateStore::new();
        store.publish(authenticated());
        assert!(store.begin_revalidation());
        assert!(!store.begin_revalidation());
        assert!(store.current().is_unknown());
    }

    #[test]
    fn expiry_only_for_authenticated() {
        let at = Utc::now();
        let state = AuthState::Authenticated { expiry: Some(at) };
        assert_eq!(state.expiry(), Some(at));
        assert_eq!(AuthState::Unauthenticated.expiry(), None);
    }
}
