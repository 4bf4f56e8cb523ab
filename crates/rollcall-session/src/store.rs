//! The session store: the single owner of the signed-in session.
//!
//! Responsibilities:
//! - Writing and clearing the session record in both storage mediums
//! - Restoring a persisted session on process start, and rejecting it
//!   when it is expired, corrupt, or only half present
//! - Publishing every state change to subscribers
//!
//! # Ordering
//!
//! `establish`, `clear`, `restore_and_validate`, and the liveness write
//! run under one async mutex. Each finishes its storage writes before it publishes, so no
//! subscriber ever sees a state that one medium already reflects and the
//! other does not.

use futures_util::future;
use rollcall_protocol::{Codec, JsonCodec, User};
use rollcall_storage::{Cookie, CookieJar, DurableStore, StorageError};
use tokio::sync::{Mutex, watch};

use crate::session::keys;
use crate::{Clock, Session, SessionConfig, SessionState, SystemClock};

/// Why a persisted session was turned away during restoration.
///
/// Never surfaced to callers; it only feeds the `debug` log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Expired,
    CorruptUser,
    CorruptTimestamp,
    /// One medium holds a session the other doesn't agree with.
    MediumMismatch,
    /// Some keys present, others missing.
    PartialRecord,
    Unreadable,
}

/// Result of looking at the persisted record (or the in-memory session).
enum Restored {
    Valid(Session),
    Absent,
    Rejected(Rejection),
}

/// Owns the session and both persistence mediums.
///
/// Shared by reference (`Arc<SessionStore<..>>`) between the orchestrator,
/// the network client, and whatever renders pages. Observers that only
/// need to react to changes take a [`SessionSubscription`] instead.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ restore_and_validate() ──→ [Authenticated] ──→ clear()
///   │               │                        ↑                │
///   │               ▼                        │                ▼
///   │          [SignedOut] ───(establish)────┘           [SignedOut]
///   ▼
/// [Loading]
/// ```
pub struct SessionStore<D, J, K = SystemClock>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
{
    durable: D,
    cookies: J,
    clock: K,
    codec: JsonCodec,
    config: SessionConfig,

    /// The in-memory session. Authoritative for the process lifetime,
    /// even when a storage write failed.
    session: Mutex<Option<Session>>,

    /// Publish side of the state channel. Holds the latest snapshot.
    state: watch::Sender<SessionState>,
}

impl<D, J, K> SessionStore<D, J, K>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
{
    /// Creates a store in the loading state. Nothing is read until
    /// [`restore_and_validate`](Self::restore_and_validate) runs.
    pub fn new(durable: D, cookies: J, clock: K, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        Self {
            durable,
            cookies,
            clock,
            codec: JsonCodec,
            config,
            session: Mutex::new(None),
            state,
        }
    }

    // =====================================================================
    // Mutations
    // =====================================================================

    /// Replaces the session with a freshly issued one.
    ///
    /// Writes the record to both mediums, then publishes the
    /// authenticated state. Storage failures are logged and swallowed:
    /// the in-memory session is still good for this process.
    pub async fn establish(&self, user: User, token: String) {
        let mut slot = self.session.lock().await;

        let session = Session {
            user,
            token,
            issued_at: self.clock.now_millis(),
        };
        self.write_session_record(&session).await;

        tracing::info!(
            user_id = %session.user.id,
            role = %session.user.role,
            "session established"
        );
        let user = session.user.clone();
        *slot = Some(session);
        self.state.send_replace(SessionState::authenticated(user));
    }

    /// Signs out: removes the record from both mediums and publishes the
    /// signed-out state.
    ///
    /// Idempotent. Calling it with nothing to clear changes nothing that
    /// an observer can see.
    pub async fn clear(&self) {
        let mut slot = self.session.lock().await;
        self.clear_locked(&mut slot, false).await;
    }

    /// Clears the session only while `token` is still the active one.
    ///
    /// Returns `true` if it cleared. A rejection aimed at a token that
    /// has since been replaced leaves the newer session alone.
    pub async fn clear_if_token(&self, token: &str) -> bool {
        let mut slot = self.session.lock().await;
        if slot.as_ref().is_none_or(|session| session.token != token) {
            return false;
        }
        self.clear_locked(&mut slot, false).await;
        true
    }

    /// Writes the liveness marker if a session is active.
    ///
    /// Returns the marker value written, or `None` when nobody is signed
    /// in. Holds the session lock for the write, so a marker can never
    /// land while `clear` is still removing the record.
    ///
    /// # Errors
    /// The durable store's error if the write fails.
    pub async fn touch_liveness(&self) -> Result<Option<u64>, StorageError> {
        let slot = self.session.lock().await;
        if slot.is_none() {
            return Ok(None);
        }
        let now = self.clock.now_millis();
        self.durable.set(keys::LIVENESS, &now.to_string()).await?;
        Ok(Some(now))
    }

    /// Restores the persisted session, once per process start.
    ///
    /// Returns `true` if a valid session is now active. Absent, expired,
    /// corrupt, and half-written records all resolve to `false` without
    /// an error; the last three are also wiped from storage.
    ///
    /// Safe to call again: later calls re-check the in-memory session's
    /// age and never put the store back into the loading state.
    pub async fn restore_and_validate(&self) -> bool {
        let mut slot = self.session.lock().await;

        let restored = match slot.as_ref() {
            Some(session) if session.is_expired(self.clock.now_millis(), &self.config) => {
                Restored::Rejected(Rejection::Expired)
            }
            Some(session) => Restored::Valid(session.clone()),
            None => self.read_session_record().await,
        };

        match restored {
            Restored::Valid(session) => {
                tracing::info!(
                    user_id = %session.user.id,
                    role = %session.user.role,
                    "session restored"
                );
                let user = session.user.clone();
                *slot = Some(session);
                self.state.send_replace(SessionState::authenticated(user));
                true
            }
            Restored::Absent => {
                tracing::debug!("no persisted session");
                *slot = None;
                self.state.send_if_modified(|state| {
                    let changed = *state != SessionState::signed_out();
                    *state = SessionState::signed_out();
                    changed
                });
                false
            }
            Restored::Rejected(reason) => {
                tracing::debug!(?reason, "persisted session rejected");
                self.clear_locked(&mut slot, true).await;
                false
            }
        }
    }

    /// Re-checks the in-memory session's age, clearing it if it has
    /// reached `max_age`.
    ///
    /// Returns `true` if a session is active and still valid. Read-only
    /// unless the session has expired.
    pub async fn check_expiry(&self) -> bool {
        let mut slot = self.session.lock().await;
        let expired = match slot.as_ref() {
            None => return false,
            Some(session) => session.is_expired(self.clock.now_millis(), &self.config),
        };
        if expired {
            tracing::info!("session expired");
            self.clear_locked(&mut slot, false).await;
        }
        !expired
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    /// `true` from construction until the first restoration resolves.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Whether a session is active, as of the last published change.
    ///
    /// Meaningless while [`is_loading`](Self::is_loading) is true.
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().authenticated
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// The latest published snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The bearer token of the active session, for the network client.
    pub async fn token(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.token.clone())
    }

    /// The store's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Registers an observer. Dropping the subscription deregisters it.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.state.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    // =====================================================================
    // Record I/O
    // =====================================================================

    /// Writes the session to both mediums as one record.
    ///
    /// The durable write and the cookie write run concurrently and are
    /// both awaited before returning. If either fails, whatever did land
    /// is removed again, so the next load finds no record at all.
    async fn write_session_record(&self, session: &Session) {
        let durable = async {
            let user = self.codec.encode(&session.user).map_err(|e| e.to_string())?;
            self.durable
                .set(keys::TOKEN, &session.token)
                .await
                .map_err(|e| e.to_string())?;
            self.durable
                .set(keys::USER, &user)
                .await
                .map_err(|e| e.to_string())?;
            self.durable
                .set(keys::ISSUED_AT, &session.issued_at.to_string())
                .await
                .map_err(|e| e.to_string())
        };
        let cookie = Cookie::new(keys::TOKEN_COOKIE, session.token.as_str())
            .max_age(self.config.max_age)
            .secure(self.config.secure_transport);

        let (durable, cookie) = future::join(durable, self.cookies.set(&cookie)).await;

        let mut complete = true;
        if let Err(error) = durable {
            tracing::warn!(%error, "failed to persist session to durable store");
            complete = false;
        }
        if let Err(error) = cookie {
            tracing::warn!(%error, "failed to persist session cookie");
            complete = false;
        }

        // Keys written before the failure would pair with leftovers from
        // the previous session on the next load.
        if !complete {
            tracing::warn!("discarding partially written session record");
            self.clear_session_record().await;
        }
    }

    /// Removes the session from both mediums. The cookie is overwritten
    /// with an already-expired one so the jar evicts it.
    async fn clear_session_record(&self) {
        let durable = async {
            for key in [keys::TOKEN, keys::USER, keys::ISSUED_AT] {
                self.durable.remove(key).await?;
            }
            Ok::<(), StorageError>(())
        };
        let expired = Cookie::expired(keys::TOKEN_COOKIE).secure(self.config.secure_transport);

        let (durable, cookie) = future::join(durable, self.cookies.set(&expired)).await;

        if let Err(error) = durable {
            tracing::warn!(%error, "failed to clear session from durable store");
        }
        if let Err(error) = cookie {
            tracing::warn!(%error, "failed to evict session cookie");
        }
    }

    /// Reads the persisted record and decides whether it is usable.
    async fn read_session_record(&self) -> Restored {
        let (token, user, issued_at, cookie) = match self.read_raw().await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::debug!(%error, "persisted session unreadable");
                return Restored::Rejected(Rejection::Unreadable);
            }
        };

        let (token, user) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            (token, user) => {
                // Nothing at all is the normal signed-out case. Any
                // leftover piece is a half-written record.
                let leftovers = token.is_some() || user.is_some() || issued_at.is_some() || cookie.is_some();
                return if leftovers {
                    Restored::Rejected(Rejection::PartialRecord)
                } else {
                    Restored::Absent
                };
            }
        };

        let Some(issued_at) = issued_at.and_then(|raw| raw.trim().parse::<u64>().ok()) else {
            return Restored::Rejected(Rejection::CorruptTimestamp);
        };
        let now = self.clock.now_millis();
        if now.saturating_sub(issued_at) >= self.config.max_age_millis() {
            return Restored::Rejected(Rejection::Expired);
        }

        let user: User = match self.codec.decode(&user) {
            Ok(user) => user,
            Err(_) => return Restored::Rejected(Rejection::CorruptUser),
        };

        if cookie.as_deref() != Some(token.as_str()) {
            return Restored::Rejected(Rejection::MediumMismatch);
        }

        Restored::Valid(Session {
            user,
            token,
            issued_at,
        })
    }

    async fn read_raw(
        &self,
    ) -> Result<
        (Option<String>, Option<String>, Option<String>, Option<String>),
        StorageError,
    > {
        let token = self.durable.get(keys::TOKEN).await?;
        let user = self.durable.get(keys::USER).await?;
        let issued_at = self.durable.get(keys::ISSUED_AT).await?;
        let cookie = self.cookies.get(keys::TOKEN_COOKIE).await?;
        Ok((token, user, issued_at, cookie))
    }

    /// Clears storage and memory, then publishes once. The caller holds
    /// the session lock.
    ///
    /// `loading` is only resolved when `resolve_loading` is set, which
    /// only restoration does.
    async fn clear_locked(&self, slot: &mut Option<Session>, resolve_loading: bool) {
        self.clear_session_record().await;

        if let Some(session) = slot.take() {
            tracing::info!(user_id = %session.user.id, "session cleared");
        }
        self.state.send_if_modified(|state| {
            let next = SessionState {
                loading: state.loading && !resolve_loading,
                authenticated: false,
                user: None,
            };
            let changed = *state != next;
            *state = next;
            changed
        });
    }
}

// ---------------------------------------------------------------------------
// SessionSubscription
// ---------------------------------------------------------------------------

/// An observer's handle on the store's state channel.
///
/// Holds no reference to the store itself. Dropping it deregisters the
/// observer; when the store is dropped, [`changed`](Self::changed)
/// starts returning `false`.
#[derive(Debug, Clone)]
pub struct SessionSubscription {
    rx: watch::Receiver<SessionState>,
}

impl SessionSubscription {
    /// The latest snapshot, marking it as seen.
    pub fn current(&mut self) -> SessionState {
        self.rx.borrow_and_update().clone()
    }

    /// Peeks at the latest snapshot without marking it as seen.
    pub fn peek(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Waits for the next change. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until the published state satisfies `predicate` and returns
    /// it. Returns `None` if the store is dropped first.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Option<SessionState>
    where
        F: FnMut(&SessionState) -> bool,
    {
        self.rx
            .wait_for(predicate)
            .await
            .ok()
            .map(|state| state.clone())
    }
}

// =========================================================================
// Tests
// =========================================================================
