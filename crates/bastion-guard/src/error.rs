//! Error types for the guard layer.

use bastion_http::HttpError;

use crate::{AuthenticatorId, ZoneId};

/// Fatal errors from the guard pipeline.
///
/// None of these are "the user typed the wrong password": those are
/// [`AuthFailure`](bastion_user::AuthFailure)s and are turned into
/// responses. A `GuardError` means the zone or one of its authenticators
/// is wired up wrong. It is returned immediately, never retried, and must
/// not be rendered as a 401/403.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// An authenticator broke its contract: it minted an unauthenticated
    /// token, a token for another zone or user, or asked for remember-me
    /// without producing a response to attach the cookie to.
    #[error("authenticator {authenticator} is misconfigured: {reason}")]
    Misconfigured {
        authenticator: AuthenticatorId,
        reason: String,
    },

    /// A provisional token names an authenticator the provider doesn't
    /// have. The coordinator and provider were built from different lists.
    #[error("no guard authenticator registered for key {0:?}")]
    UnknownAuthenticator(String),

    /// The zone configuration is invalid.
    #[error("invalid zone configuration: {0}")]
    InvalidConfig(String),

    /// The zone has several authenticators and no `entry_point`, so there
    /// is no way to decide which one should start authentication.
    #[error("zone {0} has several authenticators; set entry_point to choose the one that challenges")]
    NoEntryPoint(ZoneId),

    /// Something tried to install a token that isn't authenticated.
    #[error("refusing to install an unauthenticated token in zone {0}")]
    UnauthenticatedToken(ZoneId),

    /// Reading or writing the security context in the session failed.
    #[error(transparent)]
    Session(#[from] HttpError),
}
