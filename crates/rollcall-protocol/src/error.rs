//! Error types for the protocol layer.
//!
//! Each crate in Rollcall defines its own error enum. A `ProtocolError`
//! always means a record or response had the wrong shape, never that
//! storage or the network misbehaved.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into a stored string).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning a stored string into a Rust type).
    ///
    /// Common causes: truncated records, hand-edited storage, or a record
    /// written by an incompatible build.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value parsed, but violates a rule of the exchange, such as a
    /// login response carrying an empty token.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
