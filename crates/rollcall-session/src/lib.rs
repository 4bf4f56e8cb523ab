//! Session lifecycle management for Rollcall.
//!
//! This crate owns the one piece of state the rest of the application
//! keys off: whether someone is signed in, and as whom.
//!
//! 1. **Establishing** — recording a session after a successful
//!    credential exchange ([`SessionStore::establish`])
//! 2. **Restoring** — picking a persisted session back up on process
//!    start, and refusing it if it is too old, corrupt, or half-written
//!    ([`SessionStore::restore_and_validate`])
//! 3. **Clearing** — logout and expiry ([`SessionStore::clear`])
//! 4. **Publishing** — telling observers (route guard, heartbeat) about
//!    every change ([`SessionStore::subscribe`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Guard / Heartbeat (above)  ← observe SessionState through subscriptions
//!     ↕
//! Session Layer (this crate)  ← owns the session and both storage mediums
//!     ↕
//! Storage + Protocol (below)  ← DurableStore, CookieJar, User, JsonCodec
//! ```

#![allow(async_fn_in_trait)]

mod clock;
mod error;
mod exchange;
mod session;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use exchange::CredentialExchange;
pub use session::{Session, SessionConfig, SessionState, keys};
pub use store::{SessionStore, SessionSubscription};
