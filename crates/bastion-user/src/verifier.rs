//! Credential verification.
//!
//! How passwords are hashed is not Bastion's decision. The
//! [`PasswordVerifier`] trait is the seam: plug in argon2, bcrypt, an LDAP
//! bind, whatever your deployment uses.

use subtle::ConstantTimeEq;

use crate::{AuthFailure, User};

/// Compares a presented secret with a user's stored secret.
///
/// Implementations must be pure with respect to the user: calling
/// `verify` twice with the same inputs gives the same answer and leaves
/// the user untouched.
pub trait PasswordVerifier: Send + Sync + 'static {
    /// Returns `Ok(())` if `presented` matches the user's stored secret.
    ///
    /// # Errors
    /// [`AuthFailure::BadCredentials`] on mismatch.
    fn verify(&self, presented: &str, user: &User) -> Result<(), AuthFailure>;
}

/// Compares secrets as plain text.
///
/// Only for development and tests, where fixtures store readable
/// passwords. The comparison still runs in time independent of where the
/// strings first differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextPasswordVerifier;

impl PasswordVerifier for PlaintextPasswordVerifier {
    fn verify(&self, presented: &str, user: &User) -> Result<(), AuthFailure> {
        if bool::from(presented.as_bytes().ct_eq(user.password().as_bytes())) {
            Ok(())
        } else {
            Err(AuthFailure::BadCredentials)
        }
    }
}
