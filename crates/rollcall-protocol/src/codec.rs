//! Codec trait and implementations for persisted records.
//!
//! Storage mediums hold strings. A codec turns Rust types into those
//! strings and back. The session layer never calls `serde_json` directly;
//! it goes through a [`Codec`], so the record format lives in one place.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to strings and decode them back.
///
/// ## Trait bounds
///
/// - `Send + Sync` → the codec is held by the session store, which is
///   shared across async tasks.
/// - `'static` → it owns everything it needs.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a string suitable for a storage medium.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a stored string back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the string is malformed,
    /// incomplete, or doesn't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// The persisted user record is JSON so that other readers on the same
/// origin (diagnostics pages, server-side tooling) can inspect it.
///
/// ## Example
///
/// ```rust
/// use rollcall_protocol::{Codec, JsonCodec, Role, User, UserId};
///
/// let codec = JsonCodec;
/// let user = User {
///     id: UserId::from("u-1"),
///     role: Role::Teacher,
///     name: "Ada".into(),
///     email: None,
/// };
///
/// let stored = codec.encode(&user).unwrap();
/// let decoded: User = codec.decode(&stored).unwrap();
/// assert_eq!(user, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(data).map_err(ProtocolError::Decode)
    }
}
