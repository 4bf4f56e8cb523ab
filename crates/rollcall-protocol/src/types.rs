//! Identity types and the credential exchange shapes.
//!
//! These are the structures that either travel to and from the
//! credential exchange endpoint or get persisted in the durable store.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user, as issued by the server.
///
/// Newtype wrapper around the server's string id. `#[serde(transparent)]`
/// keeps the JSON form a plain string: `"u-42"`, not `{"0":"u-42"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if the server handed back an empty (or whitespace-only) id.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The tenant role a user signs in as.
///
/// This is a closed set: each role owns one top-level area of the
/// application (`/admin`, `/teacher`, ...). Wire values are lowercase.
///
/// `Unknown` catches any role string this build doesn't recognize, so a
/// newer server can't make an otherwise valid user record unparseable.
/// Unknown roles are sent to the fallback home by the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
    Accountant,
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Every known role, in the order their areas are listed.
    pub const KNOWN: [Role; 5] = [
        Role::Admin,
        Role::Teacher,
        Role::Student,
        Role::Parent,
        Role::Accountant,
    ];

    /// The lowercase wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Parent => "parent",
            Self::Accountant => "accountant",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The identity record of a signed-in user.
///
/// Replaced wholesale on login and dropped on logout; never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-issued id.
    pub id: UserId,

    /// Which tenant area the user belongs to.
    pub role: Role,

    /// Display name.
    pub name: String,

    /// Contact address, when the server includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Credential exchange
// ---------------------------------------------------------------------------

/// Request body of the credential exchange: `{ "email", "password" }`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Builds a credentials pair.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// The password never reaches a log line, even through `{:?}`.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful response of the credential exchange: `{ "token", "user" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque bearer credential. Never parsed client-side.
    pub token: String,

    /// The user the token belongs to.
    pub user: User,
}

impl LoginResponse {
    /// Checks the parts of the response shape that serde can't.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] when the token or the
    /// user id is empty.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.token.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "login response carried an empty token".into(),
            ));
        }
        if self.user.id.is_blank() {
            return Err(ProtocolError::InvalidMessage(
                "login response carried a user without an id".into(),
            ));
        }
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The credential exchange endpoint and the persisted user record
    //! both have fixed JSON shapes; these tests pin them down.

    use super::*;

    fn teacher() -> User {
        User {
            id: UserId::from("t-1"),
            role: Role::Teacher,
            name: "Ada".into(),
            email: None,
        }
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::from("u-42")).unwrap();
        assert_eq!(json, "\"u-42\"");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Accountant).unwrap();
        assert_eq!(json, "\"accountant\"");
    }

    #[test]
    fn test_role_unrecognized_value_deserializes_as_unknown() {
        let role: Role = serde_json::from_str("\"librarian\"").unwrap();
        assert_eq!(role, Role::Unknown);
    }

    #[test]
    fn test_role_display_matches_wire_name() {
        for role in Role::KNOWN {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }

    #[test]
    fn test_user_without_email_omits_field() {
        let json: serde_json::Value = serde_json::to_value(teacher()).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["role"], "teacher");
    }

    #[test]
    fn test_user_missing_email_deserializes_as_none() {
        let user: User =
            serde_json::from_str(r#"{"id":"s-3","role":"student","name":"Lin"}"#).unwrap();
        assert_eq!(user.email, None);
        assert_eq!(user.role, Role::Student);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("ada@school.test", "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("ada@school.test"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_login_response_json_shape() {
        let raw = r#"{"token":"abc","user":{"id":"t-1","role":"teacher","name":"Ada"}}"#;
        let response: LoginResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.token, "abc");
        assert_eq!(response.user, teacher());
    }

    #[test]
    fn test_login_response_validate_accepts_well_formed() {
        let response = LoginResponse {
            token: "abc".into(),
            user: teacher(),
        };
        assert!(response.validate().is_ok());
    }

    #[test]
    fn test_login_response_validate_rejects_empty_token() {
        let response = LoginResponse {
            token: "  ".into(),
            user: teacher(),
        };
        assert!(matches!(
            response.validate(),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_login_response_validate_rejects_blank_user_id() {
        let mut user = teacher();
        user.id = UserId::from("");
        let response = LoginResponse {
            token: "abc".into(),
            user,
        };
        assert!(matches!(
            response.validate(),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }
}
