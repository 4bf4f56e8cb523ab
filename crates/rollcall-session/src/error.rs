//! Error types for the session layer.

use rollcall_protocol::ProtocolError;

/// Errors that can surface from the session layer.
///
/// Only login produces these. An absent, expired, or corrupt persisted
/// session is not an error: restoration resolves it to "signed out"
/// without telling the caller why.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential exchange rejected the credentials or could not be
    /// reached. The message is meant to be shown to the user.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Email or password was empty; the exchange was never called.
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    /// The exchange answered, but not with a usable `{ token, user }`.
    #[error("malformed login response: {0}")]
    MalformedResponse(#[from] ProtocolError),
}
