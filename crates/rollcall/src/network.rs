//! The contract between the session and an HTTP client.
//!
//! The client attaches the bearer token to outgoing requests and reports
//! auth rejections back. It never clears the session itself: rejections
//! travel over a channel to the [`AuthOrchestrator`](crate::AuthOrchestrator),
//! which decides.

use std::sync::Arc;

use rollcall_session::{Clock, SessionStore};
use rollcall_storage::{CookieJar, DurableStore};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Pending rejections buffered before further ones are dropped. One
/// pending rejection is enough to end the session.
pub const REJECTION_CHANNEL_SIZE: usize = 8;

/// How a response bears on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSignal {
    /// 2xx and 3xx.
    Ok,
    /// 401: the server no longer accepts the token.
    AuthRejected,
    /// Any other failure, 403 included. Says nothing about the session.
    Failed,
}

impl ResponseSignal {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::AuthRejected,
            200..=399 => Self::Ok,
            _ => Self::Failed,
        }
    }
}

/// A rejection reported by the network client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRejected {
    pub status: u16,
    /// Request path that was refused.
    pub path: String,
    /// Token the refused request carried.
    pub token: String,
}

/// Creates the channel between a [`BearerAuthorizer`] and
/// [`AuthOrchestrator::run_rejection_listener`](crate::AuthOrchestrator::run_rejection_listener).
pub fn rejection_channel() -> (mpsc::Sender<AuthRejected>, mpsc::Receiver<AuthRejected>) {
    mpsc::channel(REJECTION_CHANNEL_SIZE)
}

/// Reads the token for outgoing requests and reports rejections.
#[derive(Clone)]
pub struct BearerAuthorizer<D, J, K>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
{
    store: Arc<SessionStore<D, J, K>>,
    rejections: mpsc::Sender<AuthRejected>,
}

impl<D, J, K> BearerAuthorizer<D, J, K>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
{
    pub fn new(store: Arc<SessionStore<D, J, K>>, rejections: mpsc::Sender<AuthRejected>) -> Self {
        Self { store, rejections }
    }

    /// `Authorization` header value for the active session, `None` when
    /// nobody is signed in.
    pub async fn authorization_header(&self) -> Option<String> {
        self.store.token().await.map(|token| format!("Bearer {token}"))
    }

    /// Classifies a response and forwards auth rejections.
    ///
    /// `sent_token` is the token the request carried, so the rejection
    /// only ends the session that was actually refused.
    pub fn observe(&self, path: &str, status: u16, sent_token: &str) -> ResponseSignal {
        let signal = ResponseSignal::from_status(status);
        if signal == ResponseSignal::AuthRejected {
            let rejection = AuthRejected {
                status,
                path: path.to_string(),
                token: sent_token.to_string(),
            };
            match self.rejections.try_send(rejection) {
                Ok(()) => debug!(status, path, "auth rejection forwarded"),
                Err(TrySendError::Full(_)) => debug!(status, path, "auth rejection already pending"),
                Err(TrySendError::Closed(_)) => warn!(status, path, "no rejection listener"),
            }
        }
        signal
    }
}

#[cfg(test)]
mod tests {
    use rollcall_protocol::{Role, User, UserId};
    use rollcall_session::{ManualClock, SessionConfig};
    use rollcall_storage::{MemoryCookieJar, MemoryStore};

    use super::*;

    fn authorizer() -> (
        BearerAuthorizer<MemoryStore, MemoryCookieJar, ManualClock>,
        mpsc::Receiver<AuthRejected>,
    ) {
        let store = SessionStore::new(
            MemoryStore::new(),
            MemoryCookieJar::new(),
            ManualClock::new(0),
            SessionConfig::default(),
        );
        let (tx, rx) = rejection_channel();
        (BearerAuthorizer::new(Arc::new(store), tx), rx)
    }

    #[test]
    fn test_from_status_classifies_codes() {
        assert_eq!(ResponseSignal::from_status(200), ResponseSignal::Ok);
        assert_eq!(ResponseSignal::from_status(304), ResponseSignal::Ok);
        assert_eq!(ResponseSignal::from_status(401), ResponseSignal::AuthRejected);
        assert_eq!(ResponseSignal::from_status(403), ResponseSignal::Failed);
        assert_eq!(ResponseSignal::from_status(404), ResponseSignal::Failed);
        assert_eq!(ResponseSignal::from_status(500), ResponseSignal::Failed);
    }

    #[tokio::test]
    async fn test_authorization_header_none_when_signed_out() {
        let (authorizer, _rx) = authorizer();
        assert_eq!(authorizer.authorization_header().await, None);
    }

    #[tokio::test]
    async fn test_authorization_header_carries_token() {
        let (authorizer, _rx) = authorizer();
        let user = User {
            id: UserId::from("p-1"),
            role: Role::Parent,
            name: "Rae".into(),
            email: None,
        };
        authorizer.store.establish(user, "abc".into()).await;

        assert_eq!(
            authorizer.authorization_header().await,
            Some("Bearer abc".into())
        );
    }

    #[tokio::test]
    async fn test_observe_forwards_rejection_without_clearing() {
        let (authorizer, mut rx) = authorizer();
        let user = User {
            id: UserId::from("p-1"),
            role: Role::Parent,
            name: "Rae".into(),
            email: None,
        };
        authorizer.store.establish(user, "abc".into()).await;

        let signal = authorizer.observe("/api/fees", 401, "abc");

        assert_eq!(signal, ResponseSignal::AuthRejected);
        assert_eq!(
            rx.try_recv().unwrap(),
            AuthRejected {
                status: 401,
                path: "/api/fees".into(),
                token: "abc".into(),
            }
        );
        assert!(authorizer.store.is_authenticated());
    }

    #[tokio::test]
    async fn test_observe_ignores_other_failures() {
        let (authorizer, mut rx) = authorizer();

        assert_eq!(authorizer.observe("/api/x", 500, "abc"), ResponseSignal::Failed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_observe_forbidden_is_not_a_rejection() {
        let (authorizer, mut rx) = authorizer();
        let user = User {
            id: UserId::from("t-1"),
            role: Role::Teacher,
            name: "Ada".into(),
            email: None,
        };
        authorizer.store.establish(user, "abc".into()).await;

        let signal = authorizer.observe("/api/admin/invoices", 403, "abc");

        assert_eq!(signal, ResponseSignal::Failed);
        assert!(rx.try_recv().is_err());
        assert!(authorizer.store.is_authenticated());
    }

    #[tokio::test]
    async fn test_observe_without_listener_does_not_panic() {
        let (authorizer, rx) = authorizer();
        drop(rx);

        assert_eq!(
            authorizer.observe("/api/x", 401, "abc"),
            ResponseSignal::AuthRejected
        );
    }
}
