//! # Rollcall
//!
//! Session lifecycle for role-based school web applications.
//!
//! Rollcall owns the question every page asks first: is someone signed
//! in, and as whom? It persists the answer across reloads, expires it
//! after 30 days, keeps a liveness marker fresh while it is in use, and
//! keeps signed-out users out of role areas.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollcall::prelude::*;
//!
//! // Implement CredentialExchange for your login endpoint, then:
//! // let mut ctx = SessionContextBuilder::new()
//! //     .build(FileStore::open(path), cookies, SystemClock, my_exchange)
//! //     .await?;
//! // ctx.auth().login("teacher@school.test", "secret").await?;
//! // assert!(matches!(ctx.outcome(), GuardOutcome::Render));
//! ```

mod auth;
mod context;
mod error;
mod network;

pub use auth::AuthOrchestrator;
pub use context::{RollcallConfig, SessionContext, SessionContextBuilder};
pub use error::RollcallError;
pub use network::{
    AuthRejected, BearerAuthorizer, REJECTION_CHANNEL_SIZE, ResponseSignal, rejection_channel,
};

/// Re-exports everything an application needs.
pub mod prelude {
    pub use crate::{
        AuthOrchestrator, AuthRejected, BearerAuthorizer, ResponseSignal, RollcallConfig,
        RollcallError, SessionContext, SessionContextBuilder,
    };
    pub use rollcall_guard::{GuardOutcome, GuardWatcher, RouteGuard, RouteTable};
    pub use rollcall_heartbeat::{HeartbeatConfig, HeartbeatHandle};
    pub use rollcall_protocol::{Credentials, LoginResponse, Role, User, UserId};
    pub use rollcall_session::{
        Clock, CredentialExchange, SessionConfig, SessionError, SessionState, SessionStore,
        SystemClock,
    };
    pub use rollcall_storage::{
        CookieJar, DurableStore, FileCookieJar, FileStore, MemoryCookieJar, MemoryStore,
    };
}
