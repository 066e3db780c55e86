//! Users and how Bastion finds and checks them.
//!
//! The guard pipeline never owns user data. It asks collaborators defined
//! here:
//!
//! 1. **Resolution**: map a username or API token to a [`User`]
//!    ([`UserProvider`] trait, [`InMemoryUserProvider`])
//! 2. **Account checks**: refuse disabled or locked accounts
//!    ([`UserChecker`] trait, [`DefaultUserChecker`])
//! 3. **Verification**: compare a presented secret with the stored one
//!    ([`PasswordVerifier`] trait, [`PlaintextPasswordVerifier`])
//!
//! Every expected failure along the way is an [`AuthFailure`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Guard layer (above)  ← resolves, checks, and verifies through these traits
//!     ↕
//! User layer (this crate)  ← user records and lookup/verification capabilities
//! ```

#![allow(async_fn_in_trait)]

mod checker;
mod error;
mod provider;
mod user;
mod verifier;

pub use checker::{DefaultUserChecker, UserChecker};
pub use error::AuthFailure;
pub use provider::{InMemoryUserProvider, UserProvider};
pub use user::User;
pub use verifier::{PasswordVerifier, PlaintextPasswordVerifier};
