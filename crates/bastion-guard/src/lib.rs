//! Guard: pluggable request authentication for Bastion.
//!
//! A *zone* is a protected area of an application. Each zone owns an
//! ordered list of [`Authenticator`]s and a [`GuardCoordinator`] that
//! runs them against every inbound request:
//!
//! ```text
//! Request ─→ GuardCoordinator ─→ authenticator 1: extract? ── none ─→ next
//!                                 authenticator 2: extract? ── credential
//!                                        │
//!                                        ▼
//!                               ProvisionalToken ─→ GuardProvider
//!                                        │  resolve user → check → verify → mint
//!                                        ▼
//!                        Success(Token) | Failure(AuthFailure)
//!                                        │
//!                       on_success / on_failure ─→ remember-me hook
//!                                        │
//!                                        ▼
//!                             SecurityContext (one token slot)
//! ```
//!
//! The first authenticator that finds credentials wins the request; the
//! rest are never asked.
//!
//! # Built-in authenticators
//!
//! - [`FormLoginAuthenticator`]: username/password posted to a check path
//! - [`HeaderTokenAuthenticator`]: API token in a request header
//!
//! Both are wrapped by the closed [`GuardAuthenticator`] enum that zones
//! are configured with. Custom strategies implement [`Authenticator`]
//! directly.

#![allow(async_fn_in_trait)]

mod authenticator;
mod config;
mod context;
mod coordinator;
mod credential;
mod error;
mod provider;
mod remember_me;
mod token;

pub use authenticator::{
    Authenticator, FormLoginAuthenticator, FormLoginOptions, GuardAuthenticator,
    HeaderTokenAuthenticator, HeaderTokenOptions,
};
pub use config::ZoneConfig;
pub use context::{SecurityContext, LAST_ERROR, LAST_USERNAME, target_path_key};
pub use coordinator::{GuardCoordinator, GuardCoordinatorBuilder, GuardResult, Outcome};
pub use credential::{ApiToken, GuardCredential, UsernamePassword};
pub use error::GuardError;
pub use provider::{GuardEntry, GuardProvider};
pub use remember_me::{NoRememberMe, RememberMeServices};
pub use token::{AuthenticatorId, ProvisionalToken, Token, ZoneId};
