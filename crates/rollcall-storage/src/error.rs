/// Errors that can occur in a storage medium.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading from the backing medium failed.
    #[error("read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// Writing to the backing medium failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// The backing medium exists but its contents can't be interpreted.
    #[error("storage corrupt: {0}")]
    Corrupt(String),

    /// The medium refuses writes (quota exceeded, disabled by the user).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
