//! # Bastion
//!
//! Pluggable request authentication for web applications.
//!
//! A protected area of an application (a *zone*) is configured with an
//! ordered list of authentication strategies: a login form, an API token
//! header, your own. On every request the zone's [`Firewall`] lets the
//! first strategy that finds credentials authenticate the request, records
//! the result in a per-request [`SecurityContext`], and tells the host
//! whether to answer with a response (a redirect, a `403`) or let the
//! request through.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bastion::prelude::*;
//!
//! # async fn run() -> Result<(), BastionError> {
//! let users = InMemoryUserProvider::from_json(r#"[
//!     { "username": "anna", "password": "kitten", "api_token": "ANNA_ABC" }
//! ]"#)?;
//!
//! let firewall = Firewall::new(
//!     GuardCoordinator::builder(ZoneConfig::new("api", ["api_token"]), users)
//!         .authenticator("api_token", GuardAuthenticator::header_token(HeaderTokenOptions::default()))
//!         .build()?,
//! );
//!
//! let mut request = Request::get("/api/posts").with_header("X-AUTH-TOKEN", "ANNA_ABC");
//! let mut context = SecurityContext::new();
//! let result = firewall.handle(&mut request, &mut context).await?;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```

mod error;
mod firewall;

pub use error::BastionError;
pub use firewall::{Firewall, REMEMBER_ME_AUTHENTICATOR};

/// Installs a `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling it
/// more than once is harmless: later calls leave the first subscriber in
/// place.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    //! Everything needed to configure a zone and run requests through it.

    pub use crate::{BastionError, Firewall, init_tracing};
    pub use bastion_guard::{
        Authenticator, AuthenticatorId, FormLoginAuthenticator, FormLoginOptions,
        GuardAuthenticator, GuardCoordinator, GuardCoordinatorBuilder, GuardError, GuardResult,
        HeaderTokenAuthenticator, HeaderTokenOptions, LAST_ERROR, LAST_USERNAME, Outcome,
        RememberMeServices, SecurityContext, Token, ZoneConfig, ZoneId,
    };
    pub use bastion_http::{Cookie, Method, Request, Response, Session, StatusCode};
    pub use bastion_remember_me::{RememberMeConfig, TokenRememberMeServices};
    pub use bastion_user::{
        AuthFailure, InMemoryUserProvider, PasswordVerifier, PlaintextPasswordVerifier, User,
        UserChecker, UserProvider,
    };
}
