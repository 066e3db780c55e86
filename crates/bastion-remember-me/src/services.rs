//! [`RememberMeServices`] backed by a [`PersistentTokenRegistry`].

use std::time::Duration;

use bastion_guard::{RememberMeServices, Token};
use bastion_http::{Cookie, Request, Response};
use bastion_user::{User, UserProvider};
use tokio::sync::Mutex;

use crate::{PersistentToken, PersistentTokenRegistry, RememberMeConfig, RememberMeError};

/// Form values that count as "yes, remember me".
const TRUTHY: [&str; 4] = ["true", "on", "1", "yes"];

/// Issues `series:value` cookies and redeems them for users.
///
/// Shared by every request of a zone: the registry sits behind an async
/// mutex that is never held across a call to the user provider.
pub struct TokenRememberMeServices {
    config: RememberMeConfig,
    registry: Mutex<PersistentTokenRegistry>,
}

impl TokenRememberMeServices {
    pub fn new(config: RememberMeConfig) -> Self {
        let lifetime = Duration::from_secs(config.lifetime_secs);
        Self {
            config,
            registry: Mutex::new(PersistentTokenRegistry::new(lifetime)),
        }
    }

    pub fn config(&self) -> &RememberMeConfig {
        &self.config
    }

    /// Number of tokens currently issued (including expired ones not yet
    /// cleaned up).
    pub async fn issued(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Removes expired tokens. Call periodically.
    pub async fn cleanup_expired(&self) -> usize {
        self.registry.lock().await.cleanup_expired()
    }

    /// Revokes every token of a user, e.g. after a password change.
    pub async fn revoke_user(&self, username: &str) -> usize {
        self.registry.lock().await.revoke_user(username)
    }

    fn requested(&self, request: &Request) -> bool {
        if self.config.always_remember_me {
            return true;
        }
        request
            .form_field(&self.config.remember_me_parameter)
            .map(|value| TRUTHY.contains(&value.trim().to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn presented(&self, request: &Request) -> Option<Result<PersistentToken, RememberMeError>> {
        request
            .cookie(&self.config.cookie_name)
            .map(PersistentToken::from_cookie_value)
    }

    fn cookie(&self, token: &PersistentToken) -> Cookie {
        Cookie {
            max_age: Some(self.config.lifetime_secs),
            path: self.config.path.clone(),
            secure: self.config.secure,
            http_only: self.config.http_only,
            ..Cookie::new(&self.config.cookie_name, token.to_cookie_value())
        }
    }

    fn cancel_cookie(&self, response: &mut Response) {
        response.set_cookie(Cookie::expired(&self.config.cookie_name, &self.config.path));
    }
}

impl RememberMeServices for TokenRememberMeServices {
    async fn login_success(&self, request: &Request, response: &mut Response, token: &Token) {
        if !self.requested(request) {
            tracing::debug!(user = token.username(), "remember-me not requested");
            return;
        }

        let issued = self.registry.lock().await.issue(token.username());
        response.set_cookie(self.cookie(&issued));
        tracing::info!(user = token.username(), zone = %token.zone(), "remember-me cookie issued");
    }

    async fn login_fail(&self, request: &Request, response: &mut Response) {
        if let Some(Ok(presented)) = self.presented(request) {
            self.registry.lock().await.revoke(&presented.series);
        }
        self.cancel_cookie(response);
        tracing::debug!("remember-me cookie cancelled");
    }

    async fn auto_login<P: UserProvider>(&self, request: &Request, provider: &P) -> Option<User> {
        let presented = match self.presented(request)? {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring remember-me cookie");
                return None;
            }
        };

        let validated = self.registry.lock().await.validate(&presented);
        let username = match validated {
            Ok(username) => username,
            Err(e) => {
                tracing::info!(error = %e, "remember-me cookie rejected");
                return None;
            }
        };

        match provider.load_user_by_username(&username).await {
            Ok(user) => {
                tracing::info!(user = %username, "remember-me auto-login");
                Some(user)
            }
            Err(failure) => {
                tracing::info!(user = %username, %failure, "remembered user no longer loads");
                self.registry.lock().await.revoke(&presented.series);
                None
            }
        }
    }
}
