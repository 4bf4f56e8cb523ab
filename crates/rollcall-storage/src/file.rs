//! File-backed storage mediums.
//!
//! Each medium is a single JSON object on disk. Writes go to a sibling
//! temp file first and are then renamed over the original, so a crash
//! mid-write leaves either the old contents or the new ones.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{Cookie, CookieJar, DurableStore, StorageError};

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A [`DurableStore`] persisted as a JSON object in one file.
///
/// A missing file reads as an empty store; it is created on first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: Arc<PathBuf>,
    /// Serializes read-modify-write cycles between clones.
    lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Opens (lazily) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<HashMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(self.path.as_path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(StorageError::ReadFailed(e)),
        };
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "storage file is not a JSON object");
            StorageError::Corrupt(format!("{}: {e}", self.path.display()))
        })
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(StorageError::WriteFailed)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(StorageError::WriteFailed)?;
        tokio::fs::rename(&tmp, self.path.as_path())
            .await
            .map_err(StorageError::WriteFailed)
    }

    async fn update<F>(&self, edit: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut HashMap<String, String>) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        edit(&mut map);
        self.write_map(&map).await
    }
}

impl DurableStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let (key, value) = (key.to_string(), value.to_string());
        self.update(move |map| {
            map.insert(key, value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_string();
        self.update(move |map| {
            map.remove(&key);
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// FileCookieJar
// ---------------------------------------------------------------------------

/// What a [`FileCookieJar`] keeps per cookie.
#[derive(Debug, Serialize, Deserialize)]
struct CookieRecord {
    value: String,
    /// Unix milliseconds after which the cookie is gone. `None` = session.
    #[serde(default)]
    expires_at_ms: Option<u64>,
}

/// A [`CookieJar`] persisted next to a [`FileStore`], so that both mediums
/// survive a process restart together.
///
/// Expiry is checked against the wall clock since a restart loses any
/// monotonic reference.
#[derive(Debug, Clone)]
pub struct FileCookieJar {
    inner: FileStore,
}

impl FileCookieJar {
    /// Opens (lazily) the jar at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: FileStore::open(path),
        }
    }
}

impl CookieJar for FileCookieJar {
    async fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let Some(raw) = self.inner.get(name).await? else {
            return Ok(None);
        };
        let record: CookieRecord = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Corrupt(format!("cookie {name}: {e}")))?;

        if record.expires_at_ms.is_some_and(|at| unix_millis() >= at) {
            self.inner.remove(name).await?;
            return Ok(None);
        }
        Ok(Some(record.value))
    }

    async fn set(&self, cookie: &Cookie) -> Result<(), StorageError> {
        if cookie.is_expired() {
            return self.inner.remove(&cookie.name).await;
        }

        let record = CookieRecord {
            value: cookie.value.clone(),
            expires_at_ms: cookie
                .max_age
                .map(|age| unix_millis().saturating_add(age.as_millis() as u64)),
        };
        let raw = serde_json::to_string(&record)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        self.inner.set(&cookie.name, &raw).await
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
