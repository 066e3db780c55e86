//! The user record.

use std::fmt;

use serde::{Deserialize, Serialize};

fn enabled_by_default() -> bool {
    true
}

/// A user as known to the application.
///
/// Bastion only ever *reads* users: providers hand them out, checkers and
/// verifiers inspect them, tokens keep a copy. Nothing in the pipeline
/// mutates one.
///
/// The stored `password` is whatever the configured
/// [`PasswordVerifier`](crate::PasswordVerifier) understands: a hash in
/// production, plain text in a demo.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    username: String,
    password: String,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    credentials_expired: bool,
}

impl User {
    /// Creates an enabled, unlocked user with no roles.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles: Vec::new(),
            api_token: None,
            enabled: true,
            locked: false,
            credentials_expired: false,
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn with_credentials_expired(mut self, expired: bool) -> Self {
        self.credentials_expired = expired;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The stored secret, in the verifier's format.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_credentials_expired(&self) -> bool {
        self.credentials_expired
    }

    /// Returns the user without its stored password and API token.
    ///
    /// Everything the account checks read is kept.
    pub fn without_credentials(self) -> Self {
        Self {
            password: String::new(),
            api_token: None,
            ..self
        }
    }
}

// The stored secret must never end up in logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("roles", &self.roles)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("enabled", &self.enabled)
            .field("locked", &self.locked)
            .field("credentials_expired", &self.credentials_expired)
            .finish()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}
