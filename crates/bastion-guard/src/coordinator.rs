//! The guard coordinator: runs a zone's authenticators against a request.
//!
//! Per request, per zone, the coordinator walks this state machine:
//!
//! ```text
//!   Idle ──→ Extracting ──(no credential, next authenticator)──→ Extracting
//!                │                                     │
//!                │ credential                          └─(none left)──→ Skipped
//!                ▼
//!          Authenticating ──(token)──→ Succeeded
//!                │
//!                └──(failure)──→ Failed
//! ```
//!
//! Only one authenticator may attempt per request: the first one (in
//! configuration order) that extracts credentials decides the outcome,
//! and the others are never asked.
//!
//! # Concurrency note
//!
//! `GuardCoordinator` holds no per-request state. Every method takes
//! `&self`, so one instance (usually behind an `Arc`) serves all requests
//! of the zone concurrently. The request and its [`SecurityContext`] are
//! passed in by the caller, and the context is only written as the very
//! last step of an attempt.

use bastion_http::{Request, Response};
use bastion_user::{AuthFailure, DefaultUserChecker, UserChecker, UserProvider};

use crate::context::target_path_key;
use crate::{
    Authenticator, AuthenticatorId, GuardAuthenticator, GuardEntry, GuardError, GuardProvider,
    NoRememberMe, ProvisionalToken, RememberMeServices, SecurityContext, Token, ZoneConfig,
    ZoneId,
};

// ---------------------------------------------------------------------------
// Outcome / GuardResult
// ---------------------------------------------------------------------------

/// How a request's authentication phase ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An authenticator claimed the request and authenticated it.
    Success(Token),
    /// An authenticator claimed the request and rejected it.
    Failure(AuthFailure),
    /// No authenticator found credentials. Not an attempt.
    Skip,
}

/// What [`GuardCoordinator::handle`] reports back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardResult {
    /// The authenticator that claimed the request, if any.
    pub authenticator: Option<AuthenticatorId>,
    pub outcome: Outcome,
    /// A response to send instead of running the application. `None`
    /// means the request continues.
    pub response: Option<Response>,
}

impl GuardResult {
    fn skipped() -> Self {
        Self {
            authenticator: None,
            outcome: Outcome::Skip,
            response: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skip)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }

    pub fn token(&self) -> Option<&Token> {
        match &self.outcome {
            Outcome::Success(token) => Some(token),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&AuthFailure> {
        match &self.outcome {
            Outcome::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`GuardCoordinator`] from a [`ZoneConfig`] and the
/// authenticator instances the config refers to by id.
///
/// ```rust
/// use bastion_guard::{GuardAuthenticator, GuardCoordinator, HeaderTokenOptions, ZoneConfig};
/// use bastion_user::InMemoryUserProvider;
///
/// let coordinator = GuardCoordinator::builder(
///         ZoneConfig::new("api", ["api_token"]),
///         InMemoryUserProvider::default(),
///     )
///     .authenticator("api_token", GuardAuthenticator::header_token(HeaderTokenOptions::default()))
///     .build()
///     .unwrap();
///
/// assert_eq!(coordinator.zone().as_str(), "api");
/// ```
pub struct GuardCoordinatorBuilder<P, A = GuardAuthenticator, R = NoRememberMe> {
    config: ZoneConfig,
    users: P,
    bindings: Vec<(String, A)>,
    checker: Box<dyn UserChecker>,
    remember_me: Option<R>,
}

impl<P: UserProvider, A: Authenticator> GuardCoordinatorBuilder<P, A, NoRememberMe> {
    /// Starts a builder for any authenticator type.
    pub fn new(config: ZoneConfig, users: P) -> Self {
        Self {
            config,
            users,
            bindings: Vec::new(),
            checker: Box::new(DefaultUserChecker),
            remember_me: None,
        }
    }
}

impl<P: UserProvider, A: Authenticator, R: RememberMeServices> GuardCoordinatorBuilder<P, A, R> {
    /// Binds an authenticator instance to an id from the config.
    pub fn authenticator(mut self, id: impl Into<String>, authenticator: A) -> Self {
        self.bindings.push((id.into(), authenticator));
        self
    }

    /// Replaces the default account checks.
    pub fn user_checker(mut self, checker: impl UserChecker) -> Self {
        self.checker = Box::new(checker);
        self
    }

    /// Binds a remember-me service. It's only used if the config also
    /// enables `remember_me`.
    pub fn remember_me<R2: RememberMeServices>(self, services: R2) -> GuardCoordinatorBuilder<P, A, R2> {
        GuardCoordinatorBuilder {
            config: self.config,
            users: self.users,
            bindings: self.bindings,
            checker: self.checker,
            remember_me: Some(services),
        }
    }

    /// Validates the config and the bindings and builds the coordinator.
    ///
    /// Authenticators end up in the order the *config* lists them, not the
    /// order they were bound.
    ///
    /// # Errors
    /// [`GuardError::InvalidConfig`] if the config is invalid, an id has
    /// no binding, a binding isn't named by the config, or an id is bound
    /// twice.
    pub fn build(self) -> Result<GuardCoordinator<P, A, R>, GuardError> {
        self.config.validate()?;
        let zone = self.config.zone_id();

        let mut bindings = self.bindings;
        for (i, (id, _)) in bindings.iter().enumerate() {
            if bindings[..i].iter().any(|(earlier, _)| earlier == id) {
                return Err(GuardError::InvalidConfig(format!("authenticator {id} is bound twice")));
            }
        }

        let mut entries = Vec::with_capacity(self.config.authenticators.len());
        for id in self.config.authenticator_ids() {
            let position = bindings
                .iter()
                .position(|(bound, _)| *bound == id.0)
                .ok_or_else(|| {
                    GuardError::InvalidConfig(format!(
                        "zone {zone} lists authenticator {id} but none was bound"
                    ))
                })?;
            let (_, authenticator) = bindings.swap_remove(position);
            entries.push(GuardEntry::new(&zone, id, authenticator));
        }
        if let Some((unused, _)) = bindings.first() {
            return Err(GuardError::InvalidConfig(format!(
                "authenticator {unused} is bound but not listed in zone {zone}"
            )));
        }

        let entry_point = match &self.config.entry_point {
            Some(id) => entries.iter().position(|e| e.id().0 == *id),
            None if entries.len() == 1 => Some(0),
            None => None,
        };

        tracing::info!(
            %zone,
            authenticators = entries.len(),
            remember_me = self.config.remember_me && self.remember_me.is_some(),
            "guard zone configured"
        );

        Ok(GuardCoordinator {
            remember_me: self.remember_me.filter(|_| self.config.remember_me),
            provider: GuardProvider::new(
                zone,
                entries,
                self.users,
                self.checker,
                self.config.hide_user_not_found,
            ),
            entry_point,
        })
    }
}

// ---------------------------------------------------------------------------
// GuardCoordinator
// ---------------------------------------------------------------------------

/// Runs a zone's authenticators against inbound requests.
pub struct GuardCoordinator<P, A = GuardAuthenticator, R = NoRememberMe> {
    provider: GuardProvider<P, A>,
    /// Only `Some` when the zone enables remember-me *and* a service is bound.
    remember_me: Option<R>,
    entry_point: Option<usize>,
}

impl<P: UserProvider> GuardCoordinator<P> {
    /// Starts a builder for a zone using the built-in authenticators.
    pub fn builder(config: ZoneConfig, users: P) -> GuardCoordinatorBuilder<P> {
        GuardCoordinatorBuilder::new(config, users)
    }
}

impl<P, A, R> GuardCoordinator<P, A, R>
where
    P: UserProvider,
    A: Authenticator,
    R: RememberMeServices,
{
    pub fn zone(&self) -> &ZoneId {
        self.provider.zone()
    }

    pub fn provider(&self) -> &GuardProvider<P, A> {
        &self.provider
    }

    /// The active remember-me service, if the zone has one.
    pub fn remember_me(&self) -> Option<&R> {
        self.remember_me.as_ref()
    }

    /// Runs the authentication phase for one request.
    ///
    /// - Every authenticator skips → [`Outcome::Skip`]; `context` is left
    ///   exactly as it was and no response is produced.
    /// - The first authenticator with credentials succeeds → its token is
    ///   installed in `context` and its success response (if any) returned.
    /// - It fails → `context` is cleared and its failure response returned.
    ///
    /// # Errors
    /// Fatal [`GuardError`]s only. Wrong passwords and unknown users are
    /// reported through [`Outcome::Failure`].
    pub async fn handle(
        &self,
        request: &mut Request,
        context: &mut SecurityContext,
    ) -> Result<GuardResult, GuardError> {
        let zone = self.zone();
        tracing::info!(
            %zone,
            authenticators = self.provider.entries().len(),
            "checking for guard authentication credentials"
        );

        for entry in self.provider.entries() {
            let authenticator = entry.authenticator();
            let Some(credential) = authenticator.extract_credential(request) else {
                tracing::debug!(
                    %zone,
                    authenticator = %entry.id(),
                    kind = authenticator.kind(),
                    "no credentials, skipping"
                );
                continue;
            };

            tracing::info!(
                %zone,
                authenticator = %entry.id(),
                kind = authenticator.kind(),
                "passing provisional token to the guard provider"
            );
            let provisional = ProvisionalToken::new(credential, entry.key(), zone.clone());

            // First claim wins: whatever happens next ends the loop.
            return match self.provider.authenticate(provisional).await? {
                Ok(token) => self.succeed(entry, request, context, token).await,
                Err(failure) => self.fail(entry, request, context, failure).await,
            };
        }

        Ok(GuardResult::skipped())
    }

    async fn succeed(
        &self,
        entry: &GuardEntry<A>,
        request: &mut Request,
        context: &mut SecurityContext,
        token: Token,
    ) -> Result<GuardResult, GuardError> {
        let zone = self.zone();
        let authenticator = entry.authenticator();
        tracing::info!(
            %zone,
            authenticator = %entry.id(),
            user = token.username(),
            "guard authentication successful"
        );

        let mut response = authenticator.on_success(request, &token, zone);
        if response.is_some() {
            tracing::info!(%zone, authenticator = %entry.id(), "authenticator set a success response");
        } else {
            tracing::info!(%zone, authenticator = %entry.id(), "no success response, request continues");
        }

        self.trigger_remember_me(entry, request, &token, response.as_mut()).await?;

        context.install(token.clone())?;
        Ok(GuardResult {
            authenticator: Some(entry.id().clone()),
            outcome: Outcome::Success(token),
            response,
        })
    }

    async fn fail(
        &self,
        entry: &GuardEntry<A>,
        request: &mut Request,
        context: &mut SecurityContext,
        failure: AuthFailure,
    ) -> Result<GuardResult, GuardError> {
        tracing::info!(
            zone = %self.zone(),
            authenticator = %entry.id(),
            reason = failure.message_key(),
            "guard authentication failed"
        );

        let mut response = entry.authenticator().on_failure(request, &failure);
        if let (Some(services), Some(response)) = (&self.remember_me, response.as_mut()) {
            services.login_fail(request, response).await;
        }

        context.clear();
        Ok(GuardResult {
            authenticator: Some(entry.id().clone()),
            outcome: Outcome::Failure(failure),
            response,
        })
    }

    async fn trigger_remember_me(
        &self,
        entry: &GuardEntry<A>,
        request: &Request,
        token: &Token,
        response: Option<&mut Response>,
    ) -> Result<(), GuardError> {
        if !entry.authenticator().supports_persistent_login() {
            return Ok(());
        }
        let Some(services) = &self.remember_me else {
            tracing::info!(
                zone = %self.zone(),
                authenticator = %entry.id(),
                "remember-me skipped: not configured for the zone"
            );
            return Ok(());
        };
        let Some(response) = response else {
            let reason = "on_success must return a response to use remember-me; \
                          return one, or disable remember_me for the zone"
                .to_string();
            tracing::warn!(zone = %self.zone(), authenticator = %entry.id(), %reason, "misconfigured authenticator");
            return Err(GuardError::Misconfigured {
                authenticator: entry.id().clone(),
                reason,
            });
        };

        services.login_success(request, response, token).await;
        Ok(())
    }

    /// Asks the zone's entry point to start authentication, e.g. because
    /// an anonymous visitor requested a protected page.
    ///
    /// For safe (`GET`-like) requests the requested path is remembered in
    /// the session, so a later successful form login can send the visitor
    /// back to it.
    ///
    /// # Errors
    /// [`GuardError::NoEntryPoint`] if the zone has several authenticators
    /// and none was configured as `entry_point`.
    pub fn challenge(
        &self,
        request: &mut Request,
        failure: Option<&AuthFailure>,
    ) -> Result<Response, GuardError> {
        let entry = self
            .entry_point
            .and_then(|index| self.provider.entries().get(index))
            .ok_or_else(|| GuardError::NoEntryPoint(self.zone().clone()))?;

        if request.method().is_safe() {
            let path = request.path().to_string();
            request.session_mut().set(&target_path_key(self.zone()), &path)?;
        }

        tracing::info!(zone = %self.zone(), authenticator = %entry.id(), "starting authentication");
        Ok(entry.authenticator().challenge(request, failure))
    }
}

#[cfg(test)]
mod tests {
    use bastion_http::Method;
    use bastion_user::{InMemoryUserProvider, PlaintextPasswordVerifier};

    use super::*;
    use crate::{FormLoginOptions, HeaderTokenOptions};

    fn form_login() -> GuardAuthenticator {
        GuardAuthenticator::form_login(FormLoginOptions::default(), PlaintextPasswordVerifier)
    }

    fn header_token() -> GuardAuthenticator {
        GuardAuthenticator::header_token(HeaderTokenOptions::default())
    }

    fn users() -> InMemoryUserProvider {
        InMemoryUserProvider::new([bastion_user::User::new("anna", "kitten")])
    }

    #[test]
    fn test_build_orders_authenticators_by_config() {
        let coordinator = GuardCoordinator::builder(
            ZoneConfig::new("main", ["form_login", "api_token"]),
            users(),
        )
        .authenticator("api_token", header_token())
        .authenticator("form_login", form_login())
        .build()
        .unwrap();

        let kinds: Vec<_> = coordinator
            .provider()
            .entries()
            .iter()
            .map(|e| e.authenticator().kind())
            .collect();
        assert_eq!(kinds, ["form_login", "header_token"]);
        assert_eq!(coordinator.provider().entries()[1].key(), "main_api_token");
    }

    #[test]
    fn test_build_missing_binding_rejected() {
        let result = GuardCoordinator::builder(
            ZoneConfig::new("main", ["form_login", "api_token"]),
            users(),
        )
        .authenticator("form_login", form_login())
        .build();

        assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
    }

    #[test]
    fn test_build_unlisted_binding_rejected() {
        let result = GuardCoordinator::builder(ZoneConfig::new("main", ["form_login"]), users())
            .authenticator("form_login", form_login())
            .authenticator("api_token", header_token())
            .build();

        assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
    }

    #[test]
    fn test_build_duplicate_binding_rejected() {
        let result = GuardCoordinator::builder(ZoneConfig::new("main", ["form_login"]), users())
            .authenticator("form_login", form_login())
            .authenticator("form_login", form_login())
            .build();

        assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
    }

    #[test]
    fn test_remember_me_inactive_unless_enabled_in_config() {
        let coordinator = GuardCoordinator::builder(ZoneConfig::new("main", ["form_login"]), users())
            .authenticator("form_login", form_login())
            .remember_me(NoRememberMe)
            .build()
            .unwrap();

        assert!(coordinator.remember_me().is_none());
    }

    #[test]
    fn test_challenge_without_entry_point_fails() {
        let coordinator = GuardCoordinator::builder(
            ZoneConfig::new("main", ["form_login", "api_token"]),
            users(),
        )
        .authenticator("form_login", form_login())
        .authenticator("api_token", header_token())
        .build()
        .unwrap();

        let result = coordinator.challenge(&mut Request::get("/admin/post/"), None);

        assert!(matches!(result, Err(GuardError::NoEntryPoint(zone)) if zone.as_str() == "main"));
    }

    #[test]
    fn test_challenge_single_authenticator_is_entry_point() {
        let coordinator = GuardCoordinator::builder(ZoneConfig::new("api", ["api_token"]), users())
            .authenticator("api_token", header_token())
            .build()
            .unwrap();

        let response = coordinator
            .challenge(&mut Request::get("/api/posts"), None)
            .unwrap();

        assert_eq!(response.status(), 401);
    }

    #[test]
    fn test_challenge_remembers_target_path_for_safe_methods_only() {
        let mut config = ZoneConfig::new("main", ["form_login", "api_token"]);
        config.entry_point = Some("form_login".into());
        let coordinator = GuardCoordinator::builder(config, users())
            .authenticator("form_login", form_login())
            .authenticator("api_token", header_token())
            .build()
            .unwrap();
        let key = target_path_key(coordinator.zone());

        let mut get = Request::get("/admin/post/");
        let response = coordinator.challenge(&mut get, None).unwrap();
        assert_eq!(response.location(), Some("/login"));
        assert_eq!(get.session().get_str(&key), Some("/admin/post/"));

        let mut delete = Request::new(Method::DELETE, "/admin/post/1");
        coordinator.challenge(&mut delete, None).unwrap();
        assert!(!delete.session().contains(&key));
    }

    #[test]
    fn test_guard_result_accessors() {
        let result = GuardResult {
            authenticator: Some(AuthenticatorId::new("form_login")),
            outcome: Outcome::Failure(AuthFailure::BadCredentials),
            response: None,
        };

        assert!(result.is_failure());
        assert!(!result.is_skipped());
        assert_eq!(result.failure(), Some(&AuthFailure::BadCredentials));
        assert!(result.token().is_none());
        assert!(GuardResult::skipped().is_skipped());
    }
}
