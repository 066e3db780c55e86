//! The guard provider: turns a provisional token into a real one.
//!
//! Extraction (in the coordinator) and authentication (here) are two
//! steps joined only by the provisional token's guard key. The provider
//! finds the *one* authenticator that produced the token, then runs the
//! fixed sequence every strategy shares:
//!
//! ```text
//! resolve_user → check_pre_auth → verify_credential → check_post_auth → mint_token
//! ```

use bastion_user::{AuthFailure, User, UserChecker, UserProvider};

use crate::{Authenticator, AuthenticatorId, GuardError, ProvisionalToken, Token, ZoneId};

/// A configured authenticator together with its identity in the zone.
pub struct GuardEntry<A> {
    id: AuthenticatorId,
    key: String,
    authenticator: A,
}

impl<A> GuardEntry<A> {
    pub(crate) fn new(zone: &ZoneId, id: AuthenticatorId, authenticator: A) -> Self {
        Self {
            key: zone.guard_key(&id),
            id,
            authenticator,
        }
    }

    pub fn id(&self) -> &AuthenticatorId {
        &self.id
    }

    /// The zone-unique guard key, `"{zone}_{id}"`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }
}

/// Authenticates provisional tokens for one zone.
pub struct GuardProvider<P, A> {
    zone: ZoneId,
    entries: Vec<GuardEntry<A>>,
    users: P,
    checker: Box<dyn UserChecker>,
    hide_user_not_found: bool,
}

impl<P: UserProvider, A: Authenticator> GuardProvider<P, A> {
    pub(crate) fn new(
        zone: ZoneId,
        entries: Vec<GuardEntry<A>>,
        users: P,
        checker: Box<dyn UserChecker>,
        hide_user_not_found: bool,
    ) -> Self {
        Self {
            zone,
            entries,
            users,
            checker,
            hide_user_not_found,
        }
    }

    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    /// Authenticators in configuration order.
    pub fn entries(&self) -> &[GuardEntry<A>] {
        &self.entries
    }

    /// The user provider bound to the zone.
    pub fn users(&self) -> &P {
        &self.users
    }

    /// Finds the entry for a guard key.
    pub fn entry(&self, key: &str) -> Option<&GuardEntry<A>> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Authenticates a provisional token.
    ///
    /// The two layers of `Result` keep the two kinds of outcome apart:
    ///
    /// - `Ok(Ok(token))`: authenticated
    /// - `Ok(Err(failure))`: rejected; `failure` is safe to show (unknown
    ///   users are reported as bad credentials when the zone hides them)
    /// - `Err(GuardError)`: the zone or authenticator is broken
    ///
    /// # Errors
    /// - [`GuardError::UnknownAuthenticator`]: no entry has the token's key
    /// - [`GuardError::Misconfigured`]: the minted token is unauthenticated,
    ///   for another zone, or for another user
    pub async fn authenticate(
        &self,
        provisional: ProvisionalToken<A::Credential>,
    ) -> Result<Result<Token, AuthFailure>, GuardError> {
        let entry = self
            .entry(provisional.guard_key())
            .filter(|_| *provisional.zone() == self.zone)
            .ok_or_else(|| GuardError::UnknownAuthenticator(provisional.guard_key().to_string()))?;
        let authenticator = &entry.authenticator;
        let credential = provisional.credential();

        let attempt = async {
            let user = authenticator.resolve_user(credential, &self.users).await?;
            self.checker.check_pre_auth(&user)?;
            authenticator.verify_credential(credential, &user)?;
            self.checker.check_post_auth(&user)?;
            Ok::<User, AuthFailure>(user)
        }
        .await;

        let user = match attempt {
            Ok(user) => user,
            Err(failure) => {
                tracing::debug!(
                    zone = %self.zone,
                    authenticator = %entry.id,
                    kind = authenticator.kind(),
                    %failure,
                    "credentials rejected"
                );
                return Ok(Err(self.present(failure)));
            }
        };

        let token = authenticator.mint_token(&user, &self.zone);
        self.check_minted(entry, &user, &token)?;
        Ok(Ok(token))
    }

    /// Runs the zone's account checks on a user that was authenticated by
    /// other means (e.g. a remember-me cookie).
    pub fn check_user(&self, user: &User) -> Result<(), AuthFailure> {
        self.checker.check_pre_auth(user)?;
        self.checker.check_post_auth(user)
    }

    fn present(&self, failure: AuthFailure) -> AuthFailure {
        if self.hide_user_not_found {
            failure.masked()
        } else {
            failure
        }
    }

    fn check_minted(&self, entry: &GuardEntry<A>, user: &User, token: &Token) -> Result<(), GuardError> {
        let reason = if !token.is_authenticated() {
            "mint_token returned an unauthenticated token".to_string()
        } else if *token.zone() != self.zone {
            format!("mint_token returned a token for zone {} instead of {}", token.zone(), self.zone)
        } else if token.username() != user.username() {
            format!(
                "mint_token returned a token for {} instead of the resolved user",
                token.username()
            )
        } else {
            return Ok(());
        };

        tracing::warn!(zone = %self.zone, authenticator = %entry.id, %reason, "misconfigured authenticator");
        Err(GuardError::Misconfigured {
            authenticator: entry.id.clone(),
            reason,
        })
    }
}
