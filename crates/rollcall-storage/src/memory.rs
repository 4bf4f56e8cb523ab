//! In-memory storage mediums.
//!
//! Both types wrap their map in `Arc<Mutex<..>>`, so clones share state.
//! A test can keep one clone for inspection while the session store and
//! the heartbeat agent write through theirs.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{Cookie, CookieJar, DurableStore, StorageError};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// A [`DurableStore`] backed by a `HashMap`.
///
/// Writes can be switched off with [`fail_writes`](Self::fail_writes) to
/// simulate a full or disabled store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set`/`remove` fail (or succeed again).
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryCookieJar
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct StoredCookie {
    cookie: Cookie,
    /// `None` for session cookies, which live as long as the jar.
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct JarState {
    cookies: HashMap<String, StoredCookie>,
    /// Every cookie line written, in order.
    history: Vec<String>,
}

/// A [`CookieJar`] that behaves like a browser's: `max-age` is honored
/// (against the Tokio clock, so paused-time tests can expire cookies) and
/// an expired write evicts.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    state: Arc<Mutex<JarState>>,
}

impl MemoryCookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored cookie with all its attributes.
    pub async fn cookie(&self, name: &str) -> Option<Cookie> {
        let state = self.state.lock().await;
        state
            .cookies
            .get(name)
            .filter(|stored| !is_past(stored.expires_at))
            .map(|stored| stored.cookie.clone())
    }

    /// Every cookie line written to this jar, oldest first.
    pub async fn history(&self) -> Vec<String> {
        self.state.lock().await.history.clone()
    }
}

impl CookieJar for MemoryCookieJar {
    async fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let mut state = self.state.lock().await;
        let expired = state
            .cookies
            .get(name)
            .is_some_and(|stored| is_past(stored.expires_at));
        if expired {
            state.cookies.remove(name);
            return Ok(None);
        }
        Ok(state.cookies.get(name).map(|stored| stored.cookie.value.clone()))
    }

    async fn set(&self, cookie: &Cookie) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.history.push(cookie.to_string());

        if cookie.is_expired() {
            if state.cookies.remove(&cookie.name).is_some() {
                tracing::trace!(name = %cookie.name, "cookie evicted");
            }
            return Ok(());
        }

        let expires_at = cookie.max_age.map(|age| Instant::now() + age);
        state.cookies.insert(
            cookie.name.clone(),
            StoredCookie {
                cookie: cookie.clone(),
                expires_at,
            },
        );
        Ok(())
    }
}

fn is_past(expires_at: Option<Instant>) -> bool {
    expires_at.is_some_and(|at| Instant::now() >= at)
}
