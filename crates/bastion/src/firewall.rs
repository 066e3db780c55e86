//! The firewall: one protected zone as the host application sees it.
//!
//! It ties together the layers below:
//! guard coordinator → remember-me auto-login → security context.

use bastion_guard::{
    Authenticator, AuthenticatorId, GuardAuthenticator, GuardCoordinator, GuardResult,
    NoRememberMe, Outcome, RememberMeServices, SecurityContext, Token, ZoneId,
};
use bastion_http::{Request, Response};
use bastion_user::UserProvider;

use crate::BastionError;

/// The authenticator id reported for requests authenticated from a
/// remember-me cookie.
pub const REMEMBER_ME_AUTHENTICATOR: &str = "remember_me";

/// Authentication for one zone.
///
/// ```text
/// handle() ──→ coordinator ──(skipped, anonymous)──→ remember-me auto_login
///                   │                                         │
///                   ▼                                         ▼
///            Success / Failure                    Success (installed) / Skip
/// ```
pub struct Firewall<P, A = GuardAuthenticator, R = NoRememberMe> {
    coordinator: GuardCoordinator<P, A, R>,
}

impl<P, A, R> Firewall<P, A, R>
where
    P: UserProvider,
    A: Authenticator,
    R: RememberMeServices,
{
    pub fn new(coordinator: GuardCoordinator<P, A, R>) -> Self {
        Self { coordinator }
    }

    pub fn zone(&self) -> &ZoneId {
        self.coordinator.zone()
    }

    pub fn coordinator(&self) -> &GuardCoordinator<P, A, R> {
        &self.coordinator
    }

    /// Runs the zone's authentication for one request.
    ///
    /// When no authenticator found credentials and nobody is logged in
    /// yet, a remember-me cookie (if the zone has remember-me) gets a
    /// chance to log the visitor back in. That path never produces a
    /// response; an invalid cookie just leaves the visitor anonymous.
    ///
    /// # Errors
    /// Fatal configuration errors from the coordinator.
    pub async fn handle(
        &self,
        request: &mut Request,
        context: &mut SecurityContext,
    ) -> Result<GuardResult, BastionError> {
        let result = self.coordinator.handle(request, context).await?;
        if !result.is_skipped() || context.is_authenticated() {
            return Ok(result);
        }
        match self.auto_login(request, context).await? {
            Some(token) => Ok(GuardResult {
                authenticator: Some(AuthenticatorId::new(REMEMBER_ME_AUTHENTICATOR)),
                outcome: Outcome::Success(token),
                response: None,
            }),
            None => Ok(result),
        }
    }

    /// Like [`handle`](Self::handle), but loads the zone's context from
    /// the request's session first and saves it back afterwards.
    pub async fn handle_session(
        &self,
        request: &mut Request,
    ) -> Result<(SecurityContext, GuardResult), BastionError> {
        let mut context = SecurityContext::load(request.session(), self.zone())?;
        let result = self.handle(request, &mut context).await?;
        context.persist(request.session_mut(), self.zone())?;
        Ok((context, result))
    }

    async fn auto_login(
        &self,
        request: &Request,
        context: &mut SecurityContext,
    ) -> Result<Option<Token>, BastionError> {
        let Some(services) = self.coordinator.remember_me() else {
            return Ok(None);
        };
        let provider = self.coordinator.provider();
        let Some(user) = services.auto_login(request, provider.users()).await else {
            return Ok(None);
        };

        if let Err(failure) = provider.check_user(&user) {
            tracing::info!(
                zone = %self.zone(),
                user = user.username(),
                %failure,
                "remembered user refused by account checks"
            );
            return Ok(None);
        }

        let roles = user.roles().to_vec();
        let token = Token::new(user, self.zone().clone(), roles);
        context.install(token.clone())?;
        tracing::info!(zone = %self.zone(), user = token.username(), "authenticated from remember-me cookie");
        Ok(Some(token))
    }

    /// Starts authentication through the zone's entry point.
    ///
    /// # Errors
    /// [`GuardError::NoEntryPoint`](bastion_guard::GuardError::NoEntryPoint)
    /// if the zone can't decide which authenticator should challenge.
    pub fn challenge(&self, request: &mut Request) -> Result<Response, BastionError> {
        Ok(self.coordinator.challenge(request, None)?)
    }

    /// Logs the visitor out: clears the token, drops it from the session,
    /// and cancels any remember-me cookie on `response`.
    ///
    /// Returns the token that was active, if any.
    pub async fn logout(
        &self,
        request: &mut Request,
        context: &mut SecurityContext,
        response: &mut Response,
    ) -> Result<Option<Token>, BastionError> {
        let previous = context.clear();
        context.persist(request.session_mut(), self.zone())?;
        if let Some(services) = self.coordinator.remember_me() {
            services.logout(request, response).await;
        }
        if let Some(token) = &previous {
            tracing::info!(zone = %self.zone(), user = token.username(), "logged out");
        }
        Ok(previous)
    }
}

impl<P, A, R> From<GuardCoordinator<P, A, R>> for Firewall<P, A, R>
where
    P: UserProvider,
    A: Authenticator,
    R: RememberMeServices,
{
    fn from(coordinator: GuardCoordinator<P, A, R>) -> Self {
        Self::new(coordinator)
    }
}
