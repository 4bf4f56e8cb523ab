//! Unified error type for Rollcall.

use rollcall_guard::GuardError;
use rollcall_protocol::ProtocolError;
use rollcall_session::SessionError;
use rollcall_storage::StorageError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `rollcall` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert them.
#[derive(Debug, thiserror::Error)]
pub enum RollcallError {
    /// A storage medium couldn't be opened, read, or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A record or message couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Login failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The route table can't be enforced.
    #[error(transparent)]
    Guard(#[from] GuardError),
}
