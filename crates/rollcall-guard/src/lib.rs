//! Navigation guard for Rollcall.
//!
//! Decides, for the current session state and location, whether a page
//! may render. It is re-evaluated on every change of loading state,
//! authentication, location, or role.
//!
//! # Key types
//!
//! - [`RouteGuard`] — the decision function
//! - [`GuardOutcome`] — loading placeholder, redirect, or render
//! - [`RouteTable`] — public locations, protected prefixes, role homes
//! - [`GuardWatcher`] — background task that re-evaluates on every change
//!
//! # Loading
//!
//! On a page refresh the session reads "not authenticated" until
//! restoration finishes. [`RouteGuard::evaluate`] never redirects while
//! the session is loading, so a signed-in user isn't bounced to the
//! sign-in page on reload.

mod config;
mod error;
mod guard;
mod watcher;

pub use config::RouteTable;
pub use error::GuardError;
pub use guard::{GuardOutcome, RouteGuard};
pub use watcher::GuardWatcher;
