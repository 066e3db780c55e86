//! User resolution: turning an identifier into a [`User`].
//!
//! Bastion doesn't store users: that's your database's job. Instead it
//! defines the [`UserProvider`] trait: two async lookups, one by username
//! (form login) and one by API token (header authentication). You
//! implement the trait on top of your storage, and each zone is bound to
//! one provider.
//!
//! [`InMemoryUserProvider`] is a ready-made implementation for tests,
//! demos, and small deployments that keep users in configuration.

use std::collections::HashMap;

use crate::{AuthFailure, User};

/// Looks users up by username or API token.
///
/// # Trait bounds
///
/// - `Send + Sync` → one provider is shared by every request in a zone,
///   possibly on different Tokio worker threads at once.
/// - `'static` → it lives as long as the zone does.
///
/// # Contract
///
/// - Return `Err(AuthFailure::UserNotFound)` when nobody matches.
/// - Return `Err(AuthFailure::ServiceUnavailable)` when the backing store
///   can't answer. The pipeline does not retry.
/// - Never modify the user as a side effect of a lookup.
///
/// # Example
///
/// ```rust
/// use bastion_user::{AuthFailure, User, UserProvider};
///
/// /// A provider that only knows one hard-coded user.
/// struct SingleUser(User);
///
/// impl UserProvider for SingleUser {
///     async fn load_user_by_username(&self, username: &str) -> Result<User, AuthFailure> {
///         if self.0.username() == username {
///             Ok(self.0.clone())
///         } else {
///             Err(AuthFailure::UserNotFound(username.to_string()))
///         }
///     }
///
///     async fn load_user_by_token(&self, token: &str) -> Result<User, AuthFailure> {
///         match self.0.api_token() {
///             Some(t) if t == token => Ok(self.0.clone()),
///             _ => Err(AuthFailure::UserNotFound(token.to_string())),
///         }
///     }
/// }
/// ```
pub trait UserProvider: Send + Sync + 'static {
    /// Finds the user with this username.
    fn load_user_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<User, AuthFailure>> + Send;

    /// Finds the user owning this API token.
    fn load_user_by_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<User, AuthFailure>> + Send;
}

/// A [`UserProvider`] backed by a fixed set of users held in memory.
///
/// Keeps a second index from API token to username so token lookups don't
/// scan every user. The two maps are built together and never change
/// afterwards, so they can't drift apart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserProvider {
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
}

impl InMemoryUserProvider {
    /// Creates a provider from a list of users.
    ///
    /// If two users share a username, the later one wins.
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        let mut provider = Self::default();
        for user in users {
            if let Some(token) = user.api_token() {
                provider
                    .tokens
                    .insert(token.to_string(), user.username().to_string());
            }
            provider.users.insert(user.username().to_string(), user);
        }
        provider
    }

    /// Creates a provider from a JSON array of users.
    ///
    /// ```rust
    /// use bastion_user::InMemoryUserProvider;
    ///
    /// let provider = InMemoryUserProvider::from_json(r#"[
    ///     { "username": "anna", "password": "kitten", "roles": ["ROLE_ADMIN"], "api_token": "ANNA_ABC" }
    /// ]"#).unwrap();
    ///
    /// assert_eq!(provider.len(), 1);
    /// ```
    ///
    /// # Errors
    /// Returns the `serde_json` error if the document isn't a list of users.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let users: Vec<User> = serde_json::from_str(json)?;
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserProvider for InMemoryUserProvider {
    async fn load_user_by_username(&self, username: &str) -> Result<User, AuthFailure> {
        self.users.get(username).cloned().ok_or_else(|| {
            tracing::debug!(%username, "user not found by username");
            AuthFailure::UserNotFound(username.to_string())
        })
    }

    async fn load_user_by_token(&self, token: &str) -> Result<User, AuthFailure> {
        self.tokens
            .get(token)
            .and_then(|username| self.users.get(username))
            .cloned()
            // The token itself is a secret; don't echo it into the failure.
            .ok_or_else(|| AuthFailure::UserNotFound(String::new()))
    }
}
