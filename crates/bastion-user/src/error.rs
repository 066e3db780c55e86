//! Expected authentication failures.

use serde::{Deserialize, Serialize};

/// Why an authentication attempt was rejected.
///
/// These are *expected* outcomes: a user typed the wrong password, an
/// API token was revoked, an account was disabled. The guard pipeline
/// turns every one of them into the authenticator's failure response.
/// They never escape the pipeline as errors.
///
/// Programmer mistakes (a misbehaving custom authenticator, a broken
/// zone configuration) are a different type in the guard crate, because
/// they must fail loudly instead of rendering a login form.
///
/// `Serialize`/`Deserialize` let the form-login authenticator park the
/// last failure in the session for the login page to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", content = "detail")]
pub enum AuthFailure {
    /// No user matches the presented username or token.
    #[error("user {0:?} not found")]
    UserNotFound(String),

    /// The user exists but the presented secret doesn't match.
    #[error("bad credentials")]
    BadCredentials,

    /// The account exists but has been disabled.
    #[error("account is disabled")]
    AccountDisabled,

    /// The account exists but is locked (e.g. too many attempts).
    #[error("account is locked")]
    AccountLocked,

    /// The user's stored credentials are past their expiry.
    #[error("credentials have expired")]
    CredentialsExpired,

    /// The backing store couldn't be reached. Not the user's fault, but
    /// still reported through the failure handler.
    #[error("authentication service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthFailure {
    /// A stable, user-presentable message key.
    ///
    /// Safe to show to clients: it never contains usernames or backend
    /// details. Translations can key off these strings.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "Username could not be found.",
            Self::BadCredentials => "Invalid credentials.",
            Self::AccountDisabled => "Account is disabled.",
            Self::AccountLocked => "Account is locked.",
            Self::CredentialsExpired => "Credentials have expired.",
            Self::ServiceUnavailable(_) => {
                "Authentication request could not be processed due to a system problem."
            }
        }
    }

    /// Replaces [`UserNotFound`](Self::UserNotFound) by
    /// [`BadCredentials`](Self::BadCredentials), so a response can't reveal
    /// whether a username exists.
    pub fn masked(self) -> Self {
        match self {
            Self::UserNotFound(_) => Self::BadCredentials,
            other => other,
        }
    }
}
