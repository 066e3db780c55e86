//! The authenticator capability set and the built-in strategies.
//!
//! An authenticator is one way of logging in: a login form, an API token
//! header, a signed cookie. Bastion splits every strategy into the same
//! steps so the coordinator can drive them uniformly:
//!
//! ```text
//! extract_credential ─→ resolve_user ─→ (user checks) ─→ verify_credential ─→ mint_token
//!         │                   │                                  │
//!       None               Err(AuthFailure) ─────────────── Err(AuthFailure)
//!         │                                    │
//!       skip                              on_failure          success → on_success
//! ```
//!
//! Resolution and verification are separate so that "no such user" and
//! "wrong password" flow through the same failure path, and the generic
//! failure handling isn't repeated in every strategy.

mod form_login;
mod header_token;

use std::future::Future;

use bastion_http::{Request, Response};
use bastion_user::{AuthFailure, User, UserProvider};

pub use form_login::{FormLoginAuthenticator, FormLoginOptions};
pub use header_token::{HeaderTokenAuthenticator, HeaderTokenOptions};

use crate::{GuardCredential, Token, ZoneId};

/// One authentication strategy.
///
/// # Trait bounds
///
/// - `Send + Sync` → one instance serves every request in the zone,
///   concurrently. Implementations must not keep per-request state in
///   `self`; everything request-scoped travels through the arguments.
/// - `'static` → it lives as long as the zone.
///
/// # Contract
///
/// - [`extract_credential`](Self::extract_credential) returning `None`
///   means "not for me": the coordinator moves on silently.
/// - Once credentials are extracted, the attempt ends in exactly one of
///   success or failure.
/// - [`mint_token`](Self::mint_token) must return an *authenticated* token
///   for the given user and zone. Anything else is a fatal
///   misconfiguration.
pub trait Authenticator: Send + Sync + 'static {
    /// Raw material this strategy pulls out of requests.
    type Credential: Send + Sync + 'static;

    /// A stable name for the strategy, used in log fields.
    fn kind(&self) -> &'static str;

    /// Looks for this strategy's credentials in the request.
    fn extract_credential(&self, request: &Request) -> Option<Self::Credential>;

    /// Maps the identifying part of the credential to a user.
    fn resolve_user<P: UserProvider>(
        &self,
        credential: &Self::Credential,
        provider: &P,
    ) -> impl Future<Output = Result<User, AuthFailure>> + Send;

    /// Checks the secret part of the credential against the user.
    fn verify_credential(
        &self,
        credential: &Self::Credential,
        user: &User,
    ) -> Result<(), AuthFailure>;

    /// Builds the token installed on success. Defaults to the user's roles.
    fn mint_token(&self, user: &User, zone: &ZoneId) -> Token {
        Token::new(user.clone(), zone.clone(), user.roles().to_vec())
    }

    /// Called after a successful login. `None` lets the request continue
    /// to the application.
    fn on_success(
        &self,
        request: &mut Request,
        token: &Token,
        zone: &ZoneId,
    ) -> Option<Response>;

    /// Called after a failed login. `None` lets the request continue
    /// anonymously.
    fn on_failure(&self, request: &mut Request, failure: &AuthFailure) -> Option<Response>;

    /// Whether a successful login may also issue a remember-me artifact.
    fn supports_persistent_login(&self) -> bool {
        false
    }

    /// Starts authentication for a visitor who has none (login redirect,
    /// `401`). `failure` is set when an earlier attempt was rejected.
    fn challenge(&self, request: &mut Request, failure: Option<&AuthFailure>) -> Response;
}

// ---------------------------------------------------------------------------
// GuardAuthenticator: the closed set zones are configured with
// ---------------------------------------------------------------------------

/// The built-in authentication strategies.
///
/// Zones hold a list of these, chosen when the zone is configured. Using a
/// closed enum (instead of trait objects) keeps dispatch static and makes
/// every strategy's [`kind`](Authenticator::kind) known up front.
pub enum GuardAuthenticator {
    FormLogin(FormLoginAuthenticator),
    HeaderToken(HeaderTokenAuthenticator),
}

impl GuardAuthenticator {
    /// A form-login strategy with the given options and password verifier.
    pub fn form_login(
        options: FormLoginOptions,
        verifier: impl bastion_user::PasswordVerifier,
    ) -> Self {
        Self::FormLogin(FormLoginAuthenticator::new(options, verifier))
    }

    /// A header-token strategy with the given options.
    pub fn header_token(options: HeaderTokenOptions) -> Self {
        Self::HeaderToken(HeaderTokenAuthenticator::new(options))
    }
}

impl From<FormLoginAuthenticator> for GuardAuthenticator {
    fn from(authenticator: FormLoginAuthenticator) -> Self {
        Self::FormLogin(authenticator)
    }
}

impl From<HeaderTokenAuthenticator> for GuardAuthenticator {
    fn from(authenticator: HeaderTokenAuthenticator) -> Self {
        Self::HeaderToken(authenticator)
    }
}

impl Authenticator for GuardAuthenticator {
    type Credential = GuardCredential;

    fn kind(&self) -> &'static str {
        match self {
            Self::FormLogin(a) => a.kind(),
            Self::HeaderToken(a) => a.kind(),
        }
    }

    fn extract_credential(&self, request: &Request) -> Option<GuardCredential> {
        match self {
            Self::FormLogin(a) => a
                .extract_credential(request)
                .map(GuardCredential::UsernamePassword),
            Self::HeaderToken(a) => a.extract_credential(request).map(GuardCredential::ApiToken),
        }
    }

    async fn resolve_user<P: UserProvider>(
        &self,
        credential: &GuardCredential,
        provider: &P,
    ) -> Result<User, AuthFailure> {
        match (self, credential) {
            (Self::FormLogin(a), GuardCredential::UsernamePassword(c)) => {
                a.resolve_user(c, provider).await
            }
            (Self::HeaderToken(a), GuardCredential::ApiToken(c)) => {
                a.resolve_user(c, provider).await
            }
            _ => Err(mismatched_credential(self.kind())),
        }
    }

    fn verify_credential(&self, credential: &GuardCredential, user: &User) -> Result<(), AuthFailure> {
        match (self, credential) {
            (Self::FormLogin(a), GuardCredential::UsernamePassword(c)) => a.verify_credential(c, user),
            (Self::HeaderToken(a), GuardCredential::ApiToken(c)) => a.verify_credential(c, user),
            _ => Err(mismatched_credential(self.kind())),
        }
    }

    fn mint_token(&self, user: &User, zone: &ZoneId) -> Token {
        match self {
            Self::FormLogin(a) => a.mint_token(user, zone),
            Self::HeaderToken(a) => a.mint_token(user, zone),
        }
    }

    fn on_success(&self, request: &mut Request, token: &Token, zone: &ZoneId) -> Option<Response> {
        match self {
            Self::FormLogin(a) => a.on_success(request, token, zone),
            Self::HeaderToken(a) => a.on_success(request, token, zone),
        }
    }

    fn on_failure(&self, request: &mut Request, failure: &AuthFailure) -> Option<Response> {
        match self {
            Self::FormLogin(a) => a.on_failure(request, failure),
            Self::HeaderToken(a) => a.on_failure(request, failure),
        }
    }

    fn supports_persistent_login(&self) -> bool {
        match self {
            Self::FormLogin(a) => a.supports_persistent_login(),
            Self::HeaderToken(a) => a.supports_persistent_login(),
        }
    }

    fn challenge(&self, request: &mut Request, failure: Option<&AuthFailure>) -> Response {
        match self {
            Self::FormLogin(a) => a.challenge(request, failure),
            Self::HeaderToken(a) => a.challenge(request, failure),
        }
    }
}

// Only reachable if a credential is routed to a strategy that didn't
// extract it; the guard key makes that impossible through the coordinator.
fn mismatched_credential(kind: &'static str) -> AuthFailure {
    tracing::warn!(kind, "credential handed to an authenticator that did not extract it");
    AuthFailure::BadCredentials
}
