//! Error types for the guard layer.

/// A route table that can't be enforced.
///
/// Only raised when building a [`RouteGuard`](crate::RouteGuard); once
/// built, evaluation never fails.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// A location or prefix doesn't start with `/`.
    #[error("route {0:?} must be an absolute path")]
    NotAbsolute(String),

    /// The sign-in location sits under a protected prefix, which would
    /// redirect signed-out users to a page they can't see.
    #[error("sign-in location {0:?} is under protected prefix {1:?}")]
    SignInProtected(String, String),

    /// A public location sits under a protected prefix.
    #[error("public location {0:?} is under protected prefix {1:?}")]
    PublicProtected(String, String),
}
