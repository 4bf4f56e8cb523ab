//! The route table: which locations are public, which are protected, and
//! where each role lands after signing in.

use std::collections::HashMap;

use rollcall_protocol::Role;
use serde::{Deserialize, Serialize};

use crate::GuardError;

/// Routing rules enforced by the guard.
///
/// The defaults describe the school application: one protected area per
/// role family and a `/<role>/dashboard` home in each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTable {
    /// Where signed-out users are sent.
    pub sign_in: String,

    /// Locations that never require a session. `/` matches only itself;
    /// any other entry also covers everything beneath it.
    pub public: Vec<String>,

    /// Top-level areas that require a session.
    pub protected_prefixes: Vec<String>,

    /// Landing location per role after signing in.
    pub homes: HashMap<Role, String>,

    /// Landing location for a role without an entry in `homes`.
    pub fallback_home: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        let homes = Role::KNOWN
            .into_iter()
            .map(|role| (role, format!("/{role}/dashboard")))
            .collect();
        let protected_prefixes = Role::KNOWN
            .into_iter()
            .map(|role| format!("/{role}"))
            .collect();
        Self {
            sign_in: "/login".to_string(),
            public: vec!["/".into(), "/login".into(), "/diagnostics".into()],
            protected_prefixes,
            homes,
            fallback_home: "/dashboard".to_string(),
        }
    }
}

impl RouteTable {
    /// Checks that the table can be enforced.
    ///
    /// # Errors
    /// - [`GuardError::NotAbsolute`] — a route doesn't start with `/`
    /// - [`GuardError::SignInProtected`] / [`GuardError::PublicProtected`]
    ///   — a location that must stay reachable is under a protected prefix
    pub fn validate(&self) -> Result<(), GuardError> {
        let all_routes = std::iter::once(&self.sign_in)
            .chain(&self.public)
            .chain(&self.protected_prefixes)
            .chain(self.homes.values())
            .chain(std::iter::once(&self.fallback_home));
        for route in all_routes {
            if !route.starts_with('/') {
                return Err(GuardError::NotAbsolute(route.clone()));
            }
        }

        if let Some(prefix) = self.protecting(&self.sign_in) {
            return Err(GuardError::SignInProtected(
                self.sign_in.clone(),
                prefix.to_string(),
            ));
        }
        for location in &self.public {
            if let Some(prefix) = self.protecting(location) {
                return Err(GuardError::PublicProtected(
                    location.clone(),
                    prefix.to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Where `role` lands after signing in.
    pub fn home_for(&self, role: Role) -> &str {
        self.homes
            .get(&role)
            .map(String::as_str)
            .unwrap_or(&self.fallback_home)
    }

    /// `true` if `path` is the sign-in location.
    pub fn is_sign_in(&self, path: &str) -> bool {
        normalize(path) == normalize(&self.sign_in)
    }

    /// `true` if `path` never requires a session.
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        self.public.iter().any(|entry| {
            let entry = normalize(entry);
            if entry == "/" {
                path == "/"
            } else {
                under(path, entry)
            }
        })
    }

    /// `true` if `path` requires a session. Public locations never do.
    pub fn is_protected(&self, path: &str) -> bool {
        !self.is_public(path) && self.protecting(path).is_some()
    }

    /// The protected prefix covering `path`, if any.
    fn protecting(&self, path: &str) -> Option<&str> {
        let path = normalize(path);
        self.protected_prefixes
            .iter()
            .map(|prefix| normalize(prefix))
            .find(|prefix| under(path, prefix))
    }
}

/// Strips query string, fragment, and trailing slashes (except on `/`).
pub(crate) fn normalize(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = location[..end].trim_end_matches('/');
    if path.is_empty() { "/" } else { path }
}

/// Segment-aware prefix test: `/admin` covers `/admin` and `/admin/x`,
/// but not `/administrator`.
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        assert!(RouteTable::default().validate().is_ok());
    }

    #[test]
    fn test_default_homes_follow_role_names() {
        let table = RouteTable::default();
        assert_eq!(table.home_for(Role::Teacher), "/teacher/dashboard");
        assert_eq!(table.home_for(Role::Admin), "/admin/dashboard");
        assert_eq!(table.home_for(Role::Accountant), "/accountant/dashboard");
    }

    #[test]
    fn test_home_for_unknown_role_falls_back() {
        assert_eq!(RouteTable::default().home_for(Role::Unknown), "/dashboard");
    }

    #[test]
    fn test_normalize_strips_query_fragment_and_trailing_slash() {
        assert_eq!(normalize("/admin/?tab=1#top"), "/admin");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/?next=/admin"), "/");
    }

    #[test]
    fn test_protected_prefix_is_segment_aware() {
        let table = RouteTable::default();
        assert!(table.is_protected("/admin"));
        assert!(table.is_protected("/admin/students/12"));
        assert!(!table.is_protected("/administrator"));
    }

    #[test]
    fn test_public_root_matches_only_itself() {
        let table = RouteTable::default();
        assert!(table.is_public("/"));
        assert!(!table.is_public("/teacher"));
        assert!(table.is_public("/diagnostics/storage"));
    }

    #[test]
    fn test_unlisted_location_is_neither_public_nor_protected() {
        let table = RouteTable::default();
        assert!(!table.is_public("/about"));
        assert!(!table.is_protected("/about"));
    }

    #[test]
    fn test_is_sign_in_ignores_query() {
        assert!(RouteTable::default().is_sign_in("/login?next=%2Fadmin"));
    }

    #[test]
    fn test_validate_rejects_relative_route() {
        let table = RouteTable {
            sign_in: "login".into(),
            ..RouteTable::default()
        };
        assert!(matches!(table.validate(), Err(GuardError::NotAbsolute(r)) if r == "login"));
    }

    #[test]
    fn test_validate_rejects_protected_sign_in() {
        let table = RouteTable {
            sign_in: "/admin/login".into(),
            public: vec!["/".into()],
            ..RouteTable::default()
        };
        assert!(matches!(
            table.validate(),
            Err(GuardError::SignInProtected(_, prefix)) if prefix == "/admin"
        ));
    }

    #[test]
    fn test_validate_rejects_protected_public_location() {
        let mut table = RouteTable::default();
        table.public.push("/teacher/help".into());
        assert!(matches!(table.validate(), Err(GuardError::PublicProtected(..))));
    }

    #[test]
    fn test_table_serde_round_trip_keeps_homes() {
        let json = serde_json::to_string(&RouteTable::default()).unwrap();
        let table: RouteTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table.home_for(Role::Parent), "/parent/dashboard");
    }
}
