//! Login and logout, on top of the session store.

use std::sync::Arc;

use rollcall_protocol::{Credentials, LoginResponse, User};
use rollcall_session::{Clock, CredentialExchange, SessionError, SessionStore};
use rollcall_storage::{CookieJar, DurableStore};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::network::AuthRejected;

/// Drives login and logout against a [`SessionStore`].
///
/// The only caller of [`SessionStore::establish`]. It never reads or
/// writes storage itself.
pub struct AuthOrchestrator<D, J, K, E>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
    E: CredentialExchange,
{
    store: Arc<SessionStore<D, J, K>>,
    exchange: E,
}

impl<D, J, K, E> AuthOrchestrator<D, J, K, E>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
    E: CredentialExchange,
{
    pub fn new(store: Arc<SessionStore<D, J, K>>, exchange: E) -> Self {
        Self { store, exchange }
    }

    /// Exchanges credentials and, on success, establishes the session.
    ///
    /// # Errors
    /// - [`SessionError::MissingCredentials`] — empty email or password;
    ///   the exchange is never called
    /// - [`SessionError::AuthFailed`] — the exchange rejected the
    ///   credentials or was unreachable
    /// - [`SessionError::MalformedResponse`] — the exchange answered with
    ///   an empty token or a user without an id
    ///
    /// A failed login leaves the current session, if any, untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SessionError::MissingCredentials("email"));
        }
        if password.is_empty() {
            return Err(SessionError::MissingCredentials("password"));
        }

        let credentials = Credentials::new(email, password);
        let response = self.exchange.exchange(&credentials).await.map_err(|error| {
            warn!(%error, "credential exchange failed");
            error
        })?;
        response.validate()?;

        let LoginResponse { token, user } = response;
        info!(user_id = %user.id, role = %user.role, "login succeeded");
        self.store.establish(user.clone(), token).await;
        Ok(user)
    }

    pub async fn logout(&self) {
        debug!("logout requested");
        self.store.clear().await;
    }

    /// Ends the session after the server refused `token`.
    ///
    /// Does nothing if `token` is no longer the active one: a request
    /// sent before a re-login must not end the new session.
    pub async fn handle_auth_rejected(&self, token: &str) {
        if self.store.clear_if_token(token).await {
            info!("server rejected the session token, signing out");
        } else {
            debug!("rejection for a token no longer in use, ignored");
        }
    }

    /// Handles every rejection reported by the network client. Returns
    /// once every sender is dropped.
    pub async fn run_rejection_listener(&self, mut rejections: mpsc::Receiver<AuthRejected>) {
        while let Some(rejection) = rejections.recv().await {
            debug!(status = rejection.status, path = %rejection.path, "auth rejection received");
            self.handle_auth_rejected(&rejection.token).await;
        }
        debug!("rejection listener stopped");
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.store.user()
    }

    pub fn store(&self) -> &Arc<SessionStore<D, J, K>> {
        &self.store
    }
}
