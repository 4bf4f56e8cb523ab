//! Hook for the server-side credential exchange.
//!
//! Rollcall never checks a password itself. The server does, behind an
//! endpoint that takes `{ email, password }` and answers `{ token, user }`.
//! [`CredentialExchange`] is the seam where that call plugs in: an HTTP
//! client in production, a canned answer in tests.

use std::future::Future;

use rollcall_protocol::{Credentials, LoginResponse};

use crate::SessionError;

/// Trades credentials for a bearer token and the user it belongs to.
///
/// # Example
///
/// ```rust
/// use rollcall_protocol::{Credentials, LoginResponse, Role, User, UserId};
/// use rollcall_session::{CredentialExchange, SessionError};
///
/// /// Lets exactly one account in. Development only.
/// struct SingleAccount;
///
/// impl CredentialExchange for SingleAccount {
///     async fn exchange(
///         &self,
///         credentials: &Credentials,
///     ) -> Result<LoginResponse, SessionError> {
///         if credentials.email != "admin@school.test" {
///             return Err(SessionError::AuthFailed("unknown account".into()));
///         }
///         Ok(LoginResponse {
///             token: "dev-token".into(),
///             user: User {
///                 id: UserId::from("a-1"),
///                 role: Role::Admin,
///                 name: "Admin".into(),
///                 email: Some(credentials.email.clone()),
///             },
///         })
///     }
/// }
/// ```
pub trait CredentialExchange: Send + Sync + 'static {
    /// Performs the exchange.
    ///
    /// # Returns
    /// - `Ok(LoginResponse)` — the server accepted the credentials
    /// - `Err(SessionError::AuthFailed)` — rejected or unreachable, with a
    ///   message fit to show the user
    fn exchange(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginResponse, SessionError>> + Send;
}
