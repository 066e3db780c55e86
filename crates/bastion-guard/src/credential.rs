//! Raw credential material pulled out of a request.
//!
//! A credential lives for a single request. It's produced by an
//! authenticator's extractor and consumed only by that same authenticator,
//! so each strategy defines its own type (see
//! [`Authenticator::Credential`](crate::Authenticator::Credential)).
//!
//! All of these hold secrets, so none of them derive `Debug`: the manual
//! impls redact the secret part before anything reaches a log line.

use std::fmt;

/// A username and password submitted through a login form.
#[derive(Clone, PartialEq, Eq)]
pub struct UsernamePassword {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for UsernamePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernamePassword")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An API token presented in a request header.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(pub String);

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// The credential type of the built-in
/// [`GuardAuthenticator`](crate::GuardAuthenticator) variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardCredential {
    UsernamePassword(UsernamePassword),
    ApiToken(ApiToken),
}
