//! `SessionContext` builder: one injected object holding the store and
//! everything that observes it.

use std::sync::Arc;

use rollcall_guard::{GuardOutcome, GuardWatcher, RouteGuard, RouteTable};
use rollcall_heartbeat::{HeartbeatAgent, HeartbeatConfig, HeartbeatHandle};
use rollcall_session::{Clock, CredentialExchange, SessionConfig, SessionStore};
use rollcall_storage::{CookieJar, DurableStore};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::network::rejection_channel;
use crate::{AuthOrchestrator, BearerAuthorizer, RollcallError};

/// Configuration for a whole [`SessionContext`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RollcallConfig {
    pub session: SessionConfig,
    pub heartbeat: HeartbeatConfig,
    pub routes: RouteTable,
}

/// Builder for a [`SessionContext`].
///
/// # Example
///
/// ```rust,ignore
/// use rollcall::prelude::*;
///
/// let ctx = SessionContextBuilder::new()
///     .heartbeat(HeartbeatConfig::with_interval(Duration::from_secs(60)))
///     .location("/teacher/classes")
///     .build(durable, cookies, SystemClock, my_exchange)
///     .await?;
/// ```
pub struct SessionContextBuilder {
    config: RollcallConfig,
    location: String,
}

impl SessionContextBuilder {
    /// Creates a new builder with default settings, starting at `/`.
    pub fn new() -> Self {
        Self {
            config: RollcallConfig::default(),
            location: "/".to_string(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RollcallConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn heartbeat(mut self, config: HeartbeatConfig) -> Self {
        self.config.heartbeat = config;
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.config.routes = routes;
        self
    }

    /// The location the guard starts from.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Wires the store, the heartbeat, the guard, and the network
    /// contract together, then restores any persisted session.
    ///
    /// The guard reports [`GuardOutcome::Loading`] until restoration is
    /// done; by the time this returns it no longer does.
    ///
    /// # Errors
    /// [`RollcallError::Guard`] if the route table can't be enforced.
    pub async fn build<D, J, K, E>(
        self,
        durable: D,
        cookies: J,
        clock: K,
        exchange: E,
    ) -> Result<SessionContext<D, J, K, E>, RollcallError>
    where
        D: DurableStore,
        J: CookieJar,
        K: Clock,
        E: CredentialExchange,
    {
        let guard = RouteGuard::new(self.config.routes)?;

        let store = Arc::new(SessionStore::new(durable, cookies, clock, self.config.session));

        let heartbeat = HeartbeatAgent::new(&store, self.config.heartbeat).spawn();

        let (location, location_rx) = watch::channel(self.location);
        let mut guard = GuardWatcher::spawn(guard, store.subscribe(), location_rx);

        let orchestrator = Arc::new(AuthOrchestrator::new(Arc::clone(&store), exchange));
        let (rejections_tx, rejections_rx) = rejection_channel();
        let listener = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.run_rejection_listener(rejections_rx).await }
        });
        let authorizer = BearerAuthorizer::new(Arc::clone(&store), rejections_tx);

        let restored = store.restore_and_validate().await;
        guard
            .wait_for(|outcome| *outcome != GuardOutcome::Loading)
            .await;
        info!(restored, "session context ready");

        Ok(SessionContext {
            store,
            orchestrator,
            authorizer,
            heartbeat,
            guard,
            location,
            listener,
        })
    }
}

impl Default for SessionContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the application needs to know about the session, in one
/// value passed to whoever needs it.
///
/// Owns the background tasks (heartbeat, guard watcher, rejection
/// listener). Dropping the context stops them.
pub struct SessionContext<D, J, K, E>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
    E: CredentialExchange,
{
    store: Arc<SessionStore<D, J, K>>,
    orchestrator: Arc<AuthOrchestrator<D, J, K, E>>,
    authorizer: BearerAuthorizer<D, J, K>,
    heartbeat: HeartbeatHandle,
    guard: GuardWatcher,
    location: watch::Sender<String>,
    listener: JoinHandle<()>,
}

impl<D, J, K, E> SessionContext<D, J, K, E>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
    E: CredentialExchange,
{
    pub fn store(&self) -> &Arc<SessionStore<D, J, K>> {
        &self.store
    }

    pub fn auth(&self) -> &AuthOrchestrator<D, J, K, E> {
        &self.orchestrator
    }

    /// A network-client handle. Cheap to clone.
    pub fn authorizer(&self) -> BearerAuthorizer<D, J, K> {
        self.authorizer.clone()
    }

    pub fn heartbeat(&self) -> &HeartbeatHandle {
        &self.heartbeat
    }

    pub fn guard(&mut self) -> &mut GuardWatcher {
        &mut self.guard
    }

    /// The guard's latest decision.
    pub fn outcome(&mut self) -> GuardOutcome {
        self.guard.outcome()
    }

    /// Moves to `location`, expiring the session first if it has aged
    /// out while the process was running.
    pub async fn navigate(&self, location: impl Into<String>) {
        let location = location.into();
        self.store.check_expiry().await;
        debug!(location = %location, "navigating");
        self.location.send_replace(location);
    }

    /// Stops the background tasks. The store stays usable.
    pub fn shutdown(&self) {
        self.heartbeat.shutdown();
        self.guard.shutdown();
        self.listener.abort();
        info!("session context shut down");
    }
}

impl<D, J, K, E> Drop for SessionContext<D, J, K, E>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
    E: CredentialExchange,
{
    fn drop(&mut self) {
        self.listener.abort();
    }
}
