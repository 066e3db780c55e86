//! Remember-me login for Bastion, backed by persistent tokens.
//!
//! After an interactive login the visitor may opt in to being remembered.
//! [`TokenRememberMeServices`] then issues a cookie holding a random
//! *series* and *value*, and records who it belongs to. On a later visit
//! without an active session the cookie is redeemed for the user, as long
//! as it hasn't expired or been revoked.
//!
//! ```text
//! login_success ──→ issue(series, value) ──→ Set-Cookie: REMEMBERME=series:value
//!                                                     │
//!                          (new browser session)      ▼
//! auto_login ──→ validate(series, value) ──→ load_user_by_username ──→ User
//!
//! login_fail / logout ──→ revoke(series) ──→ Set-Cookie: REMEMBERME=; Max-Age=0
//! ```
//!
//! # How it fits in the stack
//!
//! ```text
//! Guard layer (above)  ← calls RememberMeServices after each attempt
//!     ↕
//! Remember-me (this crate)  ← issues, validates, and revokes persistent tokens
//!     ↕
//! User layer (below)  ← resolves the remembered username
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod registry;
mod services;

pub use config::RememberMeConfig;
pub use error::RememberMeError;
pub use registry::{PersistentToken, PersistentTokenRegistry};
pub use services::TokenRememberMeServices;
