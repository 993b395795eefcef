use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use super::state::{AuthState, AuthStateStore};
use crate::catalog::CatalogClient;

/// Tunables for [`SessionCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Name of the cookie whose presence signals a likely-live session
    pub cookie_name: String,
    /// Minimum spacing between two throttled probes
    pub probe_throttle: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            probe_throttle: Duration::from_secs(30),
        }
    }
}

struct ProbeState {
    client: Option<Arc<dyn CatalogClient>>,
    last_probe_at: Option<Instant>,
}

struct Inner {
    state: AuthStateStore,
    probe: Mutex<ProbeState>,
    settings: SessionSettings,
}

/// Owner of the one authoritative [`AuthState`].
///
/// Cheap to clone; every clone drives the same state. Construct one at
/// startup and hand clones to whoever needs to observe or repair the
/// session.
///
/// Probes are serialized by an async mutex that also guards the bound client
/// and the instant of the last probe, so callers racing into
/// [`ensure_authenticated`](Self::ensure_authenticated) share a single
/// network round trip.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

impl fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("state", &self.inner.state.current())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl SessionCoordinator {
    /// A coordinator with no client bound. It stays `Unknown` until
    /// [`configure`](Self::configure) is called.
    pub fn new(settings: SessionSettings) -> Self {
        Self::build(settings, None)
    }

    /// A coordinator bound to `client` that has not probed yet. The first
    /// [`ensure_authenticated`](Self::ensure_authenticated) probes.
    pub fn with_client(
        settings: SessionSettings,
        client: Arc<dyn CatalogClient>,
    ) -> Self {
        Self::build(settings, Some(client))
    }

    fn build(
        settings: SessionSettings,
        client: Option<Arc<dyn CatalogClient>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AuthStateStore::new(),
                probe: Mutex::new(ProbeState {
                    client,
                    last_probe_at: None,
                }),
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    pub fn current(&self) -> AuthState {
        self.inner.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    pub fn stream(&self) -> WatchStream<AuthState> {
        self.inner.state.stream()
    }

    /// Bind the client used for probing, forget the throttle window and
    /// start a probe in the background. The returned handle resolves when
    /// that probe has published its result.
    pub async fn configure(&self, client: Arc<dyn CatalogClient>) -> JoinHandle<()> {
        {
            let mut probe = self.inner.probe.lock().await;
            probe.client = Some(client);
            probe.last_probe_at = None;
        }
        debug!("session client configured");

        let this = self.clone();
        tokio::spawn(async move { this.probe_session().await })
    }

    /// Make sure a probe has happened recently unless the session is already
    /// known to be good.
    pub async fn ensure_authenticated(&self) {
        if self.inner.state.is_authenticated() {
            return;
        }

        let mut probe = self.inner.probe.lock().await;
        // Another caller may have finished a probe while we waited
        if self.inner.state.is_authenticated() {
            return;
        }

        let now = Instant::now();
        if let Some(last) = probe.last_probe_at
            && now.duration_since(last) < self.inner.settings.probe_throttle
        {
            debug!("session probe throttled");
            return;
        }

        let Some(client) = probe.client.clone() else {
            debug!("no session client configured; skipping probe");
            return;
        };
        probe.last_probe_at = Some(now);
        self.run_probe(client.as_ref()).await;
    }

    /// Probe unconditionally, ignoring the throttle window.
    pub async fn probe_session(&self) {
        let mut probe = self.inner.probe.lock().await;
        let Some(client) = probe.client.clone() else {
            debug!("no session client configured; skipping probe");
            return;
        };
        probe.last_probe_at = Some(Instant::now());
        self.run_probe(client.as_ref()).await;
    }

    /// React to a 401/403 seen by any request. Only the first caller of a
    /// burst re-probes; the rest see `Unknown` and return.
    pub async fn recover_from_auth_failure(&self) {
        if !self.inner.state.begin_revalidation() {
            debug!("session already re-validating");
            return;
        }
        self.probe_session().await;
    }

    /// Completion hook for the external sign-in flow.
    pub async fn sign_in_completed(&self) {
        info!("sign-in completed; probing session");
        self.probe_session().await;
    }

    /// End the session server-side and publish `Unauthenticated`.
    pub async fn sign_out(&self) {
        let probe = self.inner.probe.lock().await;
        if let Some(client) = probe.client.as_ref()
            && let Err(err) = client.end_session().await
        {
            warn!(error = %err, "failed to end catalog session");
        }
        self.inner.state.publish(AuthState::Unauthenticated);
    }

    /// Two-phase publication: an optimistic guess from the local cookie jar,
    /// then the catalog's answer. Must run with the probe lock held.
    async fn run_probe(&self, client: &dyn CatalogClient) {
        let cookie_name = &self.inner.settings.cookie_name;
        if client.session_cookie(cookie_name).is_some() {
            self.inner
                .state
                .publish(AuthState::Authenticated { expiry: None });
        }

        let next = match client.is_authenticated().await {
            Ok(true) => AuthState::Authenticated {
                expiry: client
                    .session_cookie(cookie_name)
                    .and_then(|cookie| cookie.expires_at),
            },
            Ok(false) => AuthState::Unauthenticated,
            Err(err) => {
                warn!(error = %err, "session probe failed");
                AuthState::Unauthenticated
            }
        };
        self.inner.state.publish(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MockCatalogClient, SessionCookie};
    use crate::error::CatalogError;
    use futures::future::join_all;

    fn settings() -> SessionSettings {
        SessionSettings::default()
    }

    fn mock(authenticated: bool, probes: usize) -> MockCatalogClient {
        let mut client = MockCatalogClient::new();
        client.expect_session_cookie().returning(|_| None);
        client
            .expect_is_authenticated()
            .times(probes)
            .returning(move || Ok(authenticated));
        client
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_probe() {
        let coordinator =
            SessionCoordinator::with_client(settings(), Arc::new(mock(false, 1)));

        join_all((0..8).map(|_| coordinator.ensure_authenticated())).await;

        assert_eq!(coordinator.current(), AuthState::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_window_expires() {
        let coordinator =
            SessionCoordinator::with_client(settings(), Arc::new(mock(false, 2)));

        coordinator.ensure_authenticated().await;
        tokio::time::advance(Duration::from_secs(29)).await;
        coordinator.ensure_authenticated().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        coordinator.ensure_authenticated().await;
    }

    #[tokio::test]
    async fn recovery_while_unknown_does_not_probe() {
        let coordinator =
            SessionCoordinator::with_client(settings(), Arc::new(mock(true, 0)));

        coordinator.recover_from_auth_failure().await;
        coordinator.recover_from_auth_failure().await;

        assert!(coordinator.current().is_unknown());
    }

    #[tokio::test]
    async fn recovery_reprobes_authenticated_session() {
        let coordinator =
            SessionCoordinator::with_client(settings(), Arc::new(mock(true, 2)));
        coordinator.ensure_authenticated().await;
        assert!(coordinator.current().is_authenticated());

        coordinator.recover_from_auth_failure().await;
        assert!(coordinator.current().is_authenticated());
    }

    #[tokio::test]
    async fn wrong_optimistic_guess_is_corrected() {
        let mut client = MockCatalogClient::new();
        client.expect_session_cookie().returning(|name| {
            Some(SessionCookie {
                name: name.to_string(),
                expires_at: None,
            })
        });
        client.expect_is_authenticated().returning(|| Ok(false));

        let coordinator = SessionCoordinator::new(settings());
        coordinator
            .configure(Arc::new(client))
            .await
            .await
            .expect("probe task");

        assert_eq!(coordinator.current(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn probe_errors_degrade_to_unauthenticated() {
        let mut client = MockCatalogClient::new();
        client.expect_session_cookie().returning(|_| None);
        client
            .expect_is_authenticated()
            .returning(|| Err(CatalogError::Transport("reset".into())));

        let coordinator =
            SessionCoordinator::with_client(settings(), Arc::new(client));
        coordinator.probe_session().await;

        assert_eq!(coordinator.current(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn sign_out_ends_session() {
        let mut client = mock(true, 1);
        client.expect_end_session().times(1).returning(|| Ok(()));

        let coordinator =
            SessionCoordinator::with_client(settings(), Arc::new(client));
        coordinator.sign_in_completed().await;
        assert!(coordinator.current().is_authenticated());

        coordinator.sign_out().await;
        assert_eq!(coordinator.current(), AuthState::Unauthenticated);
    }
}
