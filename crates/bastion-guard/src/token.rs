//! Identity types and the two token kinds.
//!
//! - [`ProvisionalToken`]: "someone presented *these* credentials to
//!   *that* authenticator". Never authenticated.
//! - [`Token`]: "this user is authenticated in this zone with these
//!   roles". Immutable once minted.

use std::fmt;

use bastion_user::User;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The name of a protected zone (e.g. `"main"`, `"api"`).
///
/// Same newtype pattern as [`AuthenticatorId`]: both are strings
/// underneath, but the compiler won't let you pass one as the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key that ties a provisional token back to the authenticator
    /// that produced it: `"{zone}_{authenticator}"`.
    ///
    /// Unique within the zone because authenticator ids are.
    pub fn guard_key(&self, authenticator: &AuthenticatorId) -> String {
        format!("{}_{}", self.0, authenticator.0)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The stable, configured identifier of an authenticator within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthenticatorId(pub String);

impl AuthenticatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthenticatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ProvisionalToken
// ---------------------------------------------------------------------------

/// Credentials waiting to be authenticated.
///
/// Created by the coordinator right after extraction and consumed by the
/// [`GuardProvider`](crate::GuardProvider), which uses `guard_key` to find
/// the authenticator that must handle it. There is no way to mark one as
/// authenticated; authentication produces a new [`Token`] instead.
#[derive(Debug, Clone)]
pub struct ProvisionalToken<C> {
    credential: C,
    guard_key: String,
    zone: ZoneId,
}

impl<C> ProvisionalToken<C> {
    pub fn new(credential: C, guard_key: impl Into<String>, zone: ZoneId) -> Self {
        Self {
            credential,
            guard_key: guard_key.into(),
            zone,
        }
    }

    pub fn credential(&self) -> &C {
        &self.credential
    }

    pub fn guard_key(&self) -> &str {
        &self.guard_key
    }

    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    /// Always `false`.
    pub fn is_authenticated(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Proof that a user authenticated in a zone.
///
/// Fields are private and there are no setters: once minted, a token
/// never changes. `Serialize`/`Deserialize` let the security context be
/// carried across requests in the session, so the user's password and
/// API token are erased when the token is built
/// ([`User::without_credentials`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    user: User,
    zone: ZoneId,
    roles: Vec<String>,
    authenticated: bool,
}

impl Token {
    /// Mints an authenticated token.
    pub fn new(user: User, zone: ZoneId, roles: Vec<String>) -> Self {
        Self {
            user: user.without_credentials(),
            zone,
            roles,
            authenticated: true,
        }
    }

    /// Builds a token that is *not* authenticated.
    ///
    /// The security context refuses to install these; they exist so
    /// custom authenticators can represent pre-authentication states.
    pub fn unauthenticated(user: User, zone: ZoneId) -> Self {
        Self {
            user: user.without_credentials(),
            zone,
            roles: Vec::new(),
            authenticated: false,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Shorthand for `token.user().username()`.
    pub fn username(&self) -> &str {
        self.user.username()
    }

    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
