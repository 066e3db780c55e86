//! The per-request security context and well-known session keys.

use bastion_http::Session;

use crate::{GuardError, Token, ZoneId};

/// Session key of the last authentication failure, read by login pages.
pub const LAST_ERROR: &str = "_security.last_error";

/// Session key of the last username submitted to a login form.
pub const LAST_USERNAME: &str = "_security.last_username";

/// Session key of the page a visitor wanted before being sent to log in.
pub fn target_path_key(zone: &ZoneId) -> String {
    format!("_security.{zone}.target_path")
}

fn context_key(zone: &ZoneId) -> String {
    format!("_security_{zone}")
}

/// The active authentication for one zone, for one request.
///
/// There is no global token storage: the host creates a context per
/// request (usually with [`load`](Self::load) from the session), passes
/// it through the pipeline, and [`persist`](Self::persist)s it afterwards.
/// Concurrent requests therefore never see each other's tokens.
///
/// The slot holds at most one [`Token`], and only an authenticated one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityContext {
    token: Option<Token>,
}

impl SecurityContext {
    /// Creates an empty (anonymous) context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the zone's context saved by a previous request.
    ///
    /// # Errors
    /// [`GuardError::Session`] if the stored value isn't a token.
    pub fn load(session: &Session, zone: &ZoneId) -> Result<Self, GuardError> {
        let token: Option<Token> = session.get(&context_key(zone))?;
        Ok(Self {
            token: token.filter(Token::is_authenticated),
        })
    }

    /// Saves the context into the session, or removes it when empty.
    pub fn persist(&self, session: &mut Session, zone: &ZoneId) -> Result<(), GuardError> {
        match &self.token {
            Some(token) => session.set(&context_key(zone), token)?,
            None => {
                session.remove(&context_key(zone));
            }
        }
        Ok(())
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Installs `token` as the active authentication.
    ///
    /// # Errors
    /// [`GuardError::UnauthenticatedToken`] if the token isn't
    /// authenticated. The slot is left untouched in that case.
    pub fn install(&mut self, token: Token) -> Result<(), GuardError> {
        if !token.is_authenticated() {
            return Err(GuardError::UnauthenticatedToken(token.zone().clone()));
        }
        self.token = Some(token);
        Ok(())
    }

    /// Removes the active token and returns it.
    pub fn clear(&mut self) -> Option<Token> {
        self.token.take()
    }
}
