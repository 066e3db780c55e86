//! The persistent token registry: who each remember-me cookie belongs to.
//!
//! # Concurrency note
//!
//! `PersistentTokenRegistry` is a plain `HashMap` and takes `&mut self`
//! to change anything. [`TokenRememberMeServices`](crate::TokenRememberMeServices)
//! owns one behind a mutex.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use subtle::ConstantTimeEq;

use crate::RememberMeError;

/// The two halves of a remember-me cookie.
///
/// The *series* identifies the login and never changes; the *value* is
/// the secret checked against it.
#[derive(Clone, PartialEq, Eq)]
pub struct PersistentToken {
    pub series: String,
    pub value: String,
}

impl PersistentToken {
    /// Formats the token as a cookie value, `series:value`.
    pub fn to_cookie_value(&self) -> String {
        format!("{}:{}", self.series, self.value)
    }

    /// Parses a cookie value produced by [`to_cookie_value`](Self::to_cookie_value).
    ///
    /// # Errors
    /// [`RememberMeError::MalformedCookie`] if either half is missing.
    pub fn from_cookie_value(raw: &str) -> Result<Self, RememberMeError> {
        match raw.split_once(':') {
            Some((series, value)) if !series.is_empty() && !value.is_empty() => Ok(Self {
                series: series.to_string(),
                value: value.to_string(),
            }),
            _ => Err(RememberMeError::MalformedCookie),
        }
    }
}

// The value is a bearer secret.
impl std::fmt::Debug for PersistentToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentToken")
            .field("series", &self.series)
            .field("value", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    username: String,
    value: String,
    issued_at: Instant,
}

/// Issued remember-me tokens, keyed by series.
///
/// ```text
/// issue() ──→ [valid] ──(lifetime elapsed)──→ [expired] ──→ cleanup_expired()
///                │
///                ├──(validate: value mismatch)──→ revoked
///                └──(revoke)──────────────────→ revoked
/// ```
#[derive(Debug)]
pub struct PersistentTokenRegistry {
    tokens: HashMap<String, Entry>,
    lifetime: Duration,
}

impl PersistentTokenRegistry {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            tokens: HashMap::new(),
            lifetime,
        }
    }

    /// Issues a fresh token for `username`.
    pub fn issue(&mut self, username: &str) -> PersistentToken {
        let token = PersistentToken {
            series: generate_token(),
            value: generate_token(),
        };
        self.tokens.insert(
            token.series.clone(),
            Entry {
                username: username.to_string(),
                value: token.value.clone(),
                issued_at: Instant::now(),
            },
        );
        tracing::debug!(username, series = %token.series, "remember-me token issued");
        token
    }

    /// Checks a presented token and returns the username it was issued to.
    ///
    /// A mismatched value revokes the whole series: the series can only be
    /// known to someone who once held a valid cookie for it.
    ///
    /// # Errors
    /// - [`RememberMeError::UnknownSeries`]: never issued, or revoked
    /// - [`RememberMeError::TokenMismatch`]: wrong value; series revoked
    /// - [`RememberMeError::Expired`]: older than the lifetime; removed
    pub fn validate(&mut self, token: &PersistentToken) -> Result<String, RememberMeError> {
        let entry = self
            .tokens
            .get(&token.series)
            .ok_or(RememberMeError::UnknownSeries)?;

        if !bool::from(entry.value.as_bytes().ct_eq(token.value.as_bytes())) {
            tracing::warn!(
                username = %entry.username,
                series = %token.series,
                "remember-me value mismatch, revoking series"
            );
            self.tokens.remove(&token.series);
            return Err(RememberMeError::TokenMismatch);
        }
        if self.is_expired(entry) {
            self.tokens.remove(&token.series);
            return Err(RememberMeError::Expired);
        }

        Ok(entry.username.clone())
    }

    /// Revokes a series. Returns `false` if it wasn't known.
    pub fn revoke(&mut self, series: &str) -> bool {
        self.tokens.remove(series).is_some()
    }

    /// Revokes every token issued to `username`.
    pub fn revoke_user(&mut self, username: &str) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, entry| entry.username != username);
        before - self.tokens.len()
    }

    /// Removes every token older than the lifetime and returns how many
    /// were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let lifetime = self.lifetime;
        let before = self.tokens.len();
        self.tokens
            .retain(|_, entry| entry.issued_at.elapsed() < lifetime);
        let removed = before - self.tokens.len();
        if removed > 0 {
            tracing::info!(removed, "expired remember-me tokens cleaned up");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.issued_at.elapsed() >= self.lifetime
    }
}

/// Generates a random 32-character hex string (128 bits).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
