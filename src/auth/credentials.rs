use std::fmt;

use sha2::{Digest, Sha256};

/// Username/password pair for the gated site.
///
/// Held only in memory; the `Debug` impl never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials only when both parts are present and non-blank.
    ///
    /// ```
    /// use guidelines_core::Credentials;
    ///
    /// assert!(Credentials::from_parts(Some("a@b.org".into()), Some("pw".into())).is_some());
    /// assert!(Credentials::from_parts(Some("a@b.org".into()), Some("  ".into())).is_none());
    /// assert!(Credentials::from_parts(None, Some("pw".into())).is_none());
    /// ```
    #[must_use]
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        let username = username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
        let password = password.filter(|p| !p.trim().is_empty())?;
        Some(Self { username, password })
    }

    /// The login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password, for building the login form.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Digest identifying this exact pair, used to bind a session to it.
    pub(crate) fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.username.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.password.as_bytes());
        hasher.finalize().into()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("doc@example.org", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("doc@example.org"));
        assert!(!debug.contains("hunter2"), "password leaked: {debug}");
    }

    #[test]
    fn test_from_parts_trims_username() {
        let creds = Credentials::from_parts(Some("  doc@example.org ".into()), Some("pw".into()));
        assert_eq!(creds.map(|c| c.username().to_string()).as_deref(), Some("doc@example.org"));
    }

    #[test]
    fn test_fingerprint_differs_per_password() {
        let a = Credentials::new("doc", "one");
        let b = Credentials::new("doc", "two");
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }
}
