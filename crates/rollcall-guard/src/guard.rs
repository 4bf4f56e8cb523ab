//! The navigation decision.

use rollcall_session::SessionState;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::normalize;
use crate::{GuardError, RouteTable};

/// What the view layer should do for the current location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "to", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Restoration hasn't resolved. Show a placeholder, don't navigate.
    Loading,
    /// Protected location, nobody signed in.
    RedirectToSignIn(String),
    /// Sign-in location, someone already signed in.
    RedirectHome(String),
    /// Show the requested page.
    Render,
}

impl GuardOutcome {
    /// Where to navigate, if this outcome is a redirect.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::RedirectToSignIn(to) | Self::RedirectHome(to) => Some(to),
            Self::Loading | Self::Render => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect_target().is_some()
    }
}

/// Gatekeeper for protected areas.
///
/// Pure: [`evaluate`](Self::evaluate) reads nothing but its arguments, so
/// it can be called on every state or location change.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    table: RouteTable,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            table: RouteTable::default(),
        }
    }
}

impl RouteGuard {
    /// Builds a guard over `table`.
    ///
    /// # Errors
    /// Whatever [`RouteTable::validate`] rejects.
    pub fn new(table: RouteTable) -> Result<Self, GuardError> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Decides what to do at `location` given `state`.
    ///
    /// Rules, in order:
    /// 1. Loading → [`GuardOutcome::Loading`], whatever the location.
    /// 2. Protected location, not authenticated → sign-in.
    /// 3. Sign-in location, authenticated → the user's role home.
    /// 4. Otherwise → [`GuardOutcome::Render`].
    pub fn evaluate(&self, state: &SessionState, location: &str) -> GuardOutcome {
        if state.loading {
            return GuardOutcome::Loading;
        }

        let path = normalize(location);

        if !state.authenticated && self.table.is_protected(path) {
            debug!(location = path, "protected location, redirecting to sign-in");
            return GuardOutcome::RedirectToSignIn(self.table.sign_in.clone());
        }

        if state.authenticated && self.table.is_sign_in(path) {
            let home = match &state.user {
                Some(user) => self.table.home_for(user.role),
                None => &self.table.fallback_home,
            };
            debug!(location = path, home, "already signed in, redirecting home");
            return GuardOutcome::RedirectHome(home.to_string());
        }

        GuardOutcome::Render
    }
}

#[cfg(test)]
mod tests {
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use rollcall_protocol::{Role, User, UserId};

    use super::*;

    fn signed_in(role: Role) -> SessionState {
        SessionState::authenticated(User {
            id: UserId::from("u-1"),
            role,
            name: "Ada".into(),
            email: None,
        })
    }

    #[test]
    fn test_evaluate_loading_on_protected_location_waits() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.evaluate(&SessionState::loading(), "/admin/x"),
            GuardOutcome::Loading
        );
    }

    #[test]
    fn test_evaluate_loading_on_sign_in_waits() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.evaluate(&SessionState::loading(), "/login"),
            GuardOutcome::Loading
        );
    }

    #[test]
    fn test_evaluate_signed_out_on_protected_redirects_to_sign_in() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.evaluate(&SessionState::signed_out(), "/admin/x"),
            GuardOutcome::RedirectToSignIn("/login".into())
        );
    }

    #[test]
    fn test_evaluate_signed_out_on_public_renders() {
        let guard = RouteGuard::default();
        for location in ["/", "/login", "/diagnostics", "/about"] {
            assert_eq!(
                guard.evaluate(&SessionState::signed_out(), location),
                GuardOutcome::Render,
                "{location}"
            );
        }
    }

    #[test]
    fn test_evaluate_teacher_on_sign_in_redirects_to_teacher_home() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.evaluate(&signed_in(Role::Teacher), "/login"),
            GuardOutcome::RedirectHome("/teacher/dashboard".into())
        );
    }

    #[test]
    fn test_evaluate_unknown_role_on_sign_in_redirects_to_fallback() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.evaluate(&signed_in(Role::Unknown), "/login?next=/x"),
            GuardOutcome::RedirectHome("/dashboard".into())
        );
    }

    #[test]
    fn test_evaluate_signed_in_on_protected_renders() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.evaluate(&signed_in(Role::Admin), "/admin/students"),
            GuardOutcome::Render
        );
    }

    #[test]
    fn test_new_rejects_invalid_table() {
        let table = RouteTable {
            fallback_home: "dashboard".into(),
            ..RouteTable::default()
        };
        assert!(RouteGuard::new(table).is_err());
    }

    #[test]
    fn test_redirect_target_only_for_redirects() {
        assert_eq!(
            GuardOutcome::RedirectHome("/parent/dashboard".into()).redirect_target(),
            Some("/parent/dashboard")
        );
        assert!(!GuardOutcome::Render.is_redirect());
        assert!(!GuardOutcome::Loading.is_redirect());
    }
}
