//! Error types for remember-me token handling.

/// Why a remember-me cookie couldn't be redeemed.
///
/// None of these are fatal: the visitor just stays anonymous and the
/// cookie is cancelled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RememberMeError {
    /// The cookie isn't `series:value`.
    #[error("malformed remember-me cookie")]
    MalformedCookie,

    /// No token was issued with this series, or it was revoked.
    #[error("unknown remember-me series")]
    UnknownSeries,

    /// The series exists but the value doesn't match. Either the cookie
    /// was tampered with or it was stolen and already used; the series is
    /// revoked either way.
    #[error("remember-me token value mismatch; series revoked")]
    TokenMismatch,

    /// The token is older than the configured lifetime.
    #[error("remember-me token expired")]
    Expired,
}
