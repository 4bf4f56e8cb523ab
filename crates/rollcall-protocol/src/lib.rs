//! Identity types and persisted-record codecs for Rollcall.
//!
//! This crate defines the data that crosses a boundary, either the wire
//! (the credential exchange with the server) or a storage medium (the
//! persisted user record):
//!
//! - **Types** ([`User`], [`Role`], [`Credentials`], [`LoginResponse`]) —
//!   who is signed in and what the server hands back on login.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how records are turned
//!   into the strings stored in the durable store, and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding,
//!   decoding, or validating.
//!
//! # Architecture
//!
//! ```text
//! Storage (strings) → Protocol (User, LoginResponse) → Session (state)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Credentials, LoginResponse, Role, User, UserId};
