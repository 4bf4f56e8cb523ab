//! Storage mediums for Rollcall.
//!
//! A session is persisted in two independent, origin-scoped places:
//!
//! - a [`DurableStore`] — key-value storage that survives reloads but is
//!   invisible to server-side request handling, and
//! - a [`CookieJar`] — storage that rides along on every HTTP request, so
//!   a server-side routing layer can see the session too.
//!
//! This crate defines both as traits and ships two backends for each:
//! in-memory ([`MemoryStore`], [`MemoryCookieJar`]) for tests and
//! short-lived processes, and file-backed ([`FileStore`],
//! [`FileCookieJar`]) for state that must survive a restart.
//!
//! # Feature Flags
//!
//! - `file` (default) — file-backed mediums via `tokio::fs` + `serde_json`

#![allow(async_fn_in_trait)]

mod cookie;
mod error;
#[cfg(feature = "file")]
mod file;
mod memory;

pub use cookie::Cookie;
pub use error::StorageError;
#[cfg(feature = "file")]
pub use file::{FileCookieJar, FileStore};
pub use memory::{MemoryCookieJar, MemoryStore};

use std::future::Future;

/// Origin-scoped key-value storage that survives reloads.
///
/// Values are strings; anything structured goes through a codec first.
/// Implementations are cheap to clone and clones share the same backing
/// storage, the way two tabs on one origin see the same store.
pub trait DurableStore: Clone + Send + Sync + 'static {
    /// Reads the value stored under `key`, or `None` if it was never set
    /// (or has been removed).
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Cookie storage attached to outgoing HTTP requests.
///
/// There is no explicit delete: like a browser, a jar evicts a cookie
/// when it is written with `Max-Age=0` (see [`Cookie::expired`]).
pub trait CookieJar: Clone + Send + Sync + 'static {
    /// Returns the value of the named cookie if present and unexpired.
    fn get(&self, name: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Writes a cookie, honoring its attributes.
    fn set(&self, cookie: &Cookie) -> impl Future<Output = Result<(), StorageError>> + Send;
}
