//! Account status checks run around credential verification.

use crate::{AuthFailure, User};

/// Decides whether a resolved user may log in at all.
///
/// The guard provider calls [`check_pre_auth`](Self::check_pre_auth)
/// after the user is resolved and before the secret is verified, and
/// [`check_post_auth`](Self::check_post_auth) after verification
/// succeeds. Either can reject the attempt with an [`AuthFailure`].
pub trait UserChecker: Send + Sync + 'static {
    fn check_pre_auth(&self, user: &User) -> Result<(), AuthFailure>;

    fn check_post_auth(&self, user: &User) -> Result<(), AuthFailure>;
}

/// Rejects disabled and locked accounts before verification, and expired
/// credentials after it.
///
/// Expired credentials are only reported once the password has been
/// verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUserChecker;

impl UserChecker for DefaultUserChecker {
    fn check_pre_auth(&self, user: &User) -> Result<(), AuthFailure> {
        if user.is_locked() {
            return Err(AuthFailure::AccountLocked);
        }
        if !user.is_enabled() {
            return Err(AuthFailure::AccountDisabled);
        }
        Ok(())
    }

    fn check_post_auth(&self, user: &User) -> Result<(), AuthFailure> {
        if user.is_credentials_expired() {
            return Err(AuthFailure::CredentialsExpired);
        }
        Ok(())
    }
}
