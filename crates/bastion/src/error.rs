//! Unified error type for Bastion.

use bastion_guard::GuardError;
use bastion_http::HttpError;
use bastion_remember_me::RememberMeError;

/// Top-level error wrapping the errors of every Bastion crate.
///
/// Like the per-crate errors, these are fatal: a misconfigured zone, an
/// unreadable session, a broken configuration file. Rejected logins are
/// never errors; they come back as [`Outcome::Failure`](bastion_guard::Outcome).
#[derive(Debug, thiserror::Error)]
pub enum BastionError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    RememberMe(#[from] RememberMeError),

    /// A JSON configuration document (zone, users) couldn't be read.
    #[error("invalid configuration document: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use bastion_guard::ZoneId;

    use super::*;

    #[test]
    fn test_from_guard_error() {
        let err: BastionError = GuardError::NoEntryPoint(ZoneId::new("main")).into();

        assert!(matches!(err, BastionError::Guard(_)));
        assert!(err.to_string().contains("entry_point"));
    }

    #[test]
    fn test_from_remember_me_error() {
        let err: BastionError = RememberMeError::Expired.into();

        assert!(matches!(err, BastionError::RememberMe(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err: BastionError = json_err.into();

        assert!(matches!(err, BastionError::Config(_)));
        assert!(err.to_string().starts_with("invalid configuration document"));
    }
}
