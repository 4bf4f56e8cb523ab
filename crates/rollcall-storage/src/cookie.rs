//! Cookie attribute model and its `Set-Cookie` rendering.

use std::fmt;
use std::time::Duration;

/// A cookie together with the attributes it is written with.
///
/// Every cookie is scoped to the whole origin ([`Cookie::PATH`]) with
/// [`Cookie::SAME_SITE`]; only lifetime and `Secure` vary.
///
/// `Display` renders the same line a page would assign to
/// `document.cookie`:
///
/// ```rust
/// use std::time::Duration;
/// use rollcall_storage::Cookie;
///
/// let cookie = Cookie::new("token", "abc")
///     .max_age(Duration::from_secs(2_592_000))
///     .secure(true);
/// assert_eq!(
///     cookie.to_string(),
///     "token=abc; max-age=2592000; path=/; SameSite=Lax; Secure"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Lifetime from the moment of writing. `None` means a session cookie.
    pub max_age: Option<Duration>,
    /// Only sent over encrypted transport.
    pub secure: bool,
}

impl Cookie {
    /// `path` attribute of every cookie.
    pub const PATH: &'static str = "/";

    /// `SameSite` attribute of every cookie.
    pub const SAME_SITE: &'static str = "Lax";

    /// A session cookie with no `max-age`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
            secure: false,
        }
    }

    /// An already-expired, empty cookie. Writing it makes the jar evict
    /// any cookie with the same name.
    pub fn expired(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(Duration::ZERO)
    }

    /// Sets the `max-age` attribute.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the `Secure` flag.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// `true` if writing this cookie evicts it instead of storing it.
    pub fn is_expired(&self) -> bool {
        self.max_age == Some(Duration::ZERO)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; max-age={}", max_age.as_secs())?;
        }
        write!(f, "; path={}; SameSite={}", Self::PATH, Self::SAME_SITE)?;
        if self.secure {
            write!(f, "; Secure")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_session_cookie_without_secure() {
        let cookie = Cookie::new("token", "abc");
        assert!(!cookie.secure);
        assert_eq!(cookie.max_age, None);
        assert_eq!(cookie.to_string(), "token=abc; path=/; SameSite=Lax");
    }

    #[test]
    fn test_display_without_secure_omits_flag() {
        let cookie = Cookie::new("token", "abc").max_age(Duration::from_secs(60));
        assert_eq!(cookie.to_string(), "token=abc; max-age=60; path=/; SameSite=Lax");
    }

    #[test]
    fn test_expired_cookie_renders_zero_max_age() {
        let cookie = Cookie::expired("token");
        assert!(cookie.is_expired());
        assert_eq!(cookie.to_string(), "token=; max-age=0; path=/; SameSite=Lax");
    }

    #[test]
    fn test_session_cookie_is_not_expired() {
        assert!(!Cookie::new("token", "abc").is_expired());
    }

    #[test]
    fn test_secure_expired_cookie_keeps_fixed_scope() {
        let cookie = Cookie::expired("token").secure(true);
        assert_eq!(
            cookie.to_string(),
            "token=; max-age=0; path=/; SameSite=Lax; Secure"
        );
    }
}
