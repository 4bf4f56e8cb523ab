//! Session types: the record that is persisted and the snapshot that is
//! published.
//!
//! A [`Session`] is what the store holds while someone is signed in:
//! - WHO they are (`User`)
//! - WHAT proves it to the server (the bearer token)
//! - WHEN it was issued (so it can expire)
//!
//! A [`SessionState`] is what observers see. It deliberately leaves the
//! token out; code that needs the token asks the store for it.

use std::time::Duration;

use rollcall_protocol::User;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Persisted layout
// ---------------------------------------------------------------------------

/// Fixed, unversioned names of everything Rollcall persists.
///
/// Only [`SessionStore::establish`](crate::SessionStore::establish) and
/// [`SessionStore::clear`](crate::SessionStore::clear) write the token,
/// user, and issued-at keys. Anything else on the origin may read them.
pub mod keys {
    /// Durable key holding the bearer token.
    pub const TOKEN: &str = "token";
    /// Durable key holding the JSON-encoded user record.
    pub const USER: &str = "user";
    /// Durable key holding the issue time in Unix milliseconds.
    pub const ISSUED_AT: &str = "issuedAt";
    /// Durable key holding the heartbeat's liveness marker.
    pub const LIVENESS: &str = "lastActivity";
    /// Cookie carrying the bearer token to server-side request handling.
    pub const TOKEN_COOKIE: &str = "token";
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// A session this old or older is expired. Also the cookie lifetime.
    ///
    /// Default: 30 days.
    pub max_age: Duration,

    /// Whether the application is served over encrypted transport. Adds
    /// the `Secure` flag to the token cookie.
    pub secure_transport: bool,
}

impl SessionConfig {
    /// 30 days: the lifetime of a session and of its cookie.
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    /// `max_age` in milliseconds, the unit of the persisted timestamp.
    pub fn max_age_millis(&self) -> u64 {
        self.max_age.as_millis() as u64
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age: Self::DEFAULT_MAX_AGE,
            secure_transport: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A signed-in user's session, as held in memory and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Who is signed in.
    pub user: User,

    /// Opaque bearer credential. Never parsed or validated here.
    pub token: String,

    /// Unix milliseconds at which the session was established.
    ///
    /// The heartbeat never touches this: an active session still expires
    /// `max_age` after login.
    pub issued_at: u64,
}

impl Session {
    /// Milliseconds since the session was issued, as of `now`.
    ///
    /// An issue time in the future (wall clock moved backwards) reads as
    /// age zero.
    pub fn age_millis(&self, now: u64) -> u64 {
        now.saturating_sub(self.issued_at)
    }

    /// `true` once the session has reached `max_age`.
    pub fn is_expired(&self, now: u64, config: &SessionConfig) -> bool {
        self.age_millis(now) >= config.max_age_millis()
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The snapshot published to observers on every change.
///
/// ```text
///   Loading ──(restore ok)──→ Authenticated ──(clear/expire)──→ SignedOut
///      │                            ↑                              │
///      └──(nothing / expired)──→ SignedOut ──────(establish)───────┘
/// ```
///
/// `loading` is true only until the first restoration resolves. While it
/// is true, `authenticated` says nothing and must not drive navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub loading: bool,
    pub authenticated: bool,
    pub user: Option<User>,
}

impl SessionState {
    /// The state at process start, before restoration has resolved.
    pub fn loading() -> Self {
        Self {
            loading: true,
            authenticated: false,
            user: None,
        }
    }

    /// Resolved, nobody signed in.
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            authenticated: false,
            user: None,
        }
    }

    /// Resolved, `user` signed in.
    pub fn authenticated(user: User) -> Self {
        Self {
            loading: false,
            authenticated: true,
            user: Some(user),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::loading()
    }
}

#[cfg(test)]
mod tests {
    use rollcall_protocol::{Role, UserId};

    use super::*;

    fn session(issued_at: u64) -> Session {
        Session {
            user: User {
                id: UserId::from("s-1"),
                role: Role::Student,
                name: "Lin".into(),
                email: None,
            },
            token: "abc".into(),
            issued_at,
        }
    }

    #[test]
    fn test_default_max_age_is_thirty_days_in_cookie_seconds() {
        // The cookie attribute is written in seconds: max-age=2592000.
        assert_eq!(SessionConfig::default().max_age.as_secs(), 2_592_000);
    }

    #[test]
    fn test_is_expired_boundary_is_inclusive() {
        let config = SessionConfig::default();
        let max = config.max_age_millis();
        let s = session(1_000);

        assert!(!s.is_expired(1_000 + max - 1, &config));
        assert!(s.is_expired(1_000 + max, &config));
    }

    #[test]
    fn test_age_with_future_issue_time_is_zero() {
        assert_eq!(session(5_000).age_millis(1_000), 0);
    }

    #[test]
    fn test_state_default_is_loading() {
        let state = SessionState::default();
        assert!(state.loading);
        assert!(!state.authenticated);
        assert!(state.user.is_none());
    }

    #[test]
    fn test_state_authenticated_is_resolved() {
        let state = SessionState::authenticated(session(0).user);
        assert!(!state.loading);
        assert!(state.authenticated);
    }
}
