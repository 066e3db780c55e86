//! Integration tests for the guard pipeline using the blog's users.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bastion_guard::{
    Authenticator, AuthenticatorId, FormLoginOptions, GuardAuthenticator, GuardCoordinator,
    GuardCoordinatorBuilder, GuardError, GuardResult, HeaderTokenOptions, LAST_ERROR,
    LAST_USERNAME, Outcome, ProvisionalToken, RememberMeServices, SecurityContext, Token, ZoneConfig,
    ZoneId, target_path_key,
};
use bastion_http::{Cookie, Request, Response, StatusCode};
use bastion_user::{AuthFailure, InMemoryUserProvider, PlaintextPasswordVerifier, User, UserProvider};

// =========================================================================
// Fixtures
// =========================================================================

fn blog_users() -> InMemoryUserProvider {
    InMemoryUserProvider::new([
        User::new("anna", "kitten")
            .with_roles(["ROLE_ADMIN"])
            .with_api_token("ANNA_ABC"),
        User::new("jane_admin", "kitten").with_roles(["ROLE_ADMIN"]),
        User::new("tom", "kitten").with_enabled(false),
    ])
}

fn main_zone() -> ZoneConfig {
    let mut config = ZoneConfig::new("main", ["form_login", "api_token"]);
    config.entry_point = Some("form_login".into());
    config
}

fn coordinator() -> GuardCoordinator<InMemoryUserProvider> {
    GuardCoordinator::builder(main_zone(), blog_users())
        .authenticator(
            "form_login",
            GuardAuthenticator::form_login(FormLoginOptions::default(), PlaintextPasswordVerifier),
        )
        .authenticator(
            "api_token",
            GuardAuthenticator::header_token(HeaderTokenOptions::default()),
        )
        .build()
        .expect("blog zone is valid")
}

fn login_post(username: &str, password: &str) -> Request {
    Request::post("/login_check")
        .with_form_field("_username", username)
        .with_form_field("_password", password)
}

fn json_body(response: &Response) -> serde_json::Value {
    serde_json::from_str(response.body()).expect("json body")
}

// =========================================================================
// Header token
// =========================================================================

#[tokio::test]
async fn test_header_token_success_continues_request() {
    let coordinator = coordinator();
    let mut request = Request::get("/admin/post/").with_header("X-AUTH-TOKEN", "ANNA_ABC");
    let mut context = SecurityContext::new();

    let result = coordinator.handle(&mut request, &mut context).await.unwrap();

    assert_eq!(result.authenticator, Some(AuthenticatorId::new("api_token")));
    assert_eq!(result.token().map(Token::username), Some("anna"));
    assert!(result.response.is_none());
    let installed = context.token().expect("token installed");
    assert_eq!(installed.username(), "anna");
    assert_eq!(installed.zone().as_str(), "main");
    assert!(installed.has_role("ROLE_ADMIN"));
}

#[tokio::test]
async fn test_no_credentials_skips_and_leaves_state_untouched() {
    let coordinator = coordinator();
    let mut request = Request::get("/blog/");
    let mut context = SecurityContext::new();
    let session_before = request.session().clone();

    let result = coordinator.handle(&mut request, &mut context).await.unwrap();

    assert_eq!(
        result,
        GuardResult {
            authenticator: None,
            outcome: Outcome::Skip,
            response: None,
        }
    );
    assert!(!context.is_authenticated());
    assert_eq!(request.session(), &session_before);
}

#[tokio::test]
async fn test_skip_keeps_existing_authentication() {
    let coordinator = coordinator();
    let mut context = SecurityContext::new();
    context
        .install(Token::new(User::new("anna", "kitten"), ZoneId::new("main"), vec![]))
        .unwrap();

    let result = coordinator
        .handle(&mut Request::get("/blog/"), &mut context)
        .await
        .unwrap();

    assert!(result.is_skipped());
    assert_eq!(context.token().map(Token::username), Some("anna"));
}

#[tokio::test]
async fn test_unknown_header_token_fails_with_403() {
    let coordinator = coordinator();
    let mut request = Request::get("/admin/post/").with_header("X-AUTH-TOKEN", "NOPE");
    let mut context = SecurityContext::new();

    let result = coordinator.handle(&mut request, &mut context).await.unwrap();

    // Unknown tokens look exactly like bad credentials.
    assert_eq!(result.failure(), Some(&AuthFailure::BadCredentials));
    let response = result.response.expect("header token answers failures");
    assert_eq!(response.status(), 403);
    assert_eq!(json_body(&response)["message"], "Invalid credentials.");
    assert!(!context.is_authenticated());
}

#[tokio::test]
async fn test_failure_clears_previous_authentication() {
    let coordinator = coordinator();
    let mut context = SecurityContext::new();
    context
        .install(Token::new(User::new("jane_admin", "kitten"), ZoneId::new("main"), vec![]))
        .unwrap();
    let mut request = Request::get("/admin/post/").with_header("X-AUTH-TOKEN", "NOPE");

    let result = coordinator.handle(&mut request, &mut context).await.unwrap();

    assert!(result.is_failure());
    assert!(context.token().is_none());
}

// =========================================================================
// Form login
// =========================================================================

#[tokio::test]
async fn test_form_login_success_redirects_to_target_path() {
    let coordinator = coordinator();
    let mut context = SecurityContext::new();

    // An anonymous visit to a protected page is challenged first.
    let mut protected = Request::get("/admin/post/");
    let challenge = coordinator.challenge(&mut protected, None).unwrap();
    assert_eq!(challenge.location(), Some("/login"));

    let mut request =
        login_post("anna", "kitten").with_session(protected.into_session());
    request
        .session_mut()
        .set(LAST_ERROR, &AuthFailure::BadCredentials)
        .unwrap();

    let result = coordinator.handle(&mut request, &mut context).await.unwrap();

    assert_eq!(result.authenticator, Some(AuthenticatorId::new("form_login")));
    assert_eq!(result.token().map(Token::username), Some("anna"));
    let response = result.response.expect("form login redirects");
    assert_eq!(response.location(), Some("/admin/post/"));
    assert!(!request.session().contains(LAST_ERROR));
    assert!(!request.session().contains(&target_path_key(coordinator.zone())));
    assert!(context.is_authenticated());
}

#[tokio::test]
async fn test_form_login_success_without_target_goes_home() {
    let coordinator = coordinator();
    let mut context = SecurityContext::new();

    let result = coordinator
        .handle(&mut login_post("jane_admin", "kitten"), &mut context)
        .await
        .unwrap();

    assert_eq!(result.response.and_then(|r| r.location().map(str::to_string)), Some("/".into()));
}

#[tokio::test]
async fn test_form_login_bad_password_redirects_to_form() {
    let coordinator = coordinator();
    let mut request = login_post("anna", "puppy");
    let mut context = SecurityContext::new();

    let result = coordinator.handle(&mut request, &mut context).await.unwrap();

    assert_eq!(result.failure(), Some(&AuthFailure::BadCredentials));
    assert_eq!(result.response.as_ref().and_then(Response::location), Some("/login"));
    let stored: Option<AuthFailure> = request.session().get(LAST_ERROR).unwrap();
    assert_eq!(stored, Some(AuthFailure::BadCredentials));
    assert_eq!(request.session().get_str(LAST_USERNAME), Some("anna"));
    assert!(!context.is_authenticated());
}

#[tokio::test]
async fn test_unknown_user_is_masked_as_bad_credentials() {
    let coordinator = coordinator();
    let mut context = SecurityContext::new();

    let result = coordinator
        .handle(&mut login_post("mallory", "kitten"), &mut context)
        .await
        .unwrap();

    assert_eq!(result.failure(), Some(&AuthFailure::BadCredentials));
}

#[tokio::test]
async fn test_unknown_user_reported_when_not_hidden() {
    let mut config = main_zone();
    config.hide_user_not_found = false;
    let coordinator = GuardCoordinator::builder(config, blog_users())
        .authenticator(
            "form_login",
            GuardAuthenticator::form_login(FormLoginOptions::default(), PlaintextPasswordVerifier),
        )
        .authenticator("api_token", GuardAuthenticator::header_token(HeaderTokenOptions::default()))
        .build()
        .unwrap();

    let result = coordinator
        .handle(&mut login_post("mallory", "kitten"), &mut SecurityContext::new())
        .await
        .unwrap();

    assert_eq!(result.failure(), Some(&AuthFailure::UserNotFound("mallory".into())));
}

#[tokio::test]
async fn test_disabled_account_fails_before_password_check() {
    let coordinator = coordinator();

    // Even the wrong password reports the account state.
    let result = coordinator
        .handle(&mut login_post("tom", "wrong"), &mut SecurityContext::new())
        .await
        .unwrap();

    assert_eq!(result.failure(), Some(&AuthFailure::AccountDisabled));
}

// =========================================================================
// First claim wins
// =========================================================================

/// A test authenticator that claims every request carrying its header and
/// counts how often it was asked.
struct ProbeAuthenticator {
    header: &'static str,
    asked: Arc<AtomicUsize>,
    persistent: bool,
    respond: bool,
    mint_for: Option<&'static str>,
}

impl ProbeAuthenticator {
    fn new(header: &'static str) -> Self {
        Self {
            header,
            asked: Arc::new(AtomicUsize::new(0)),
            persistent: false,
            respond: false,
            mint_for: None,
        }
    }
}

impl Authenticator for ProbeAuthenticator {
    type Credential = String;

    fn kind(&self) -> &'static str {
        "probe"
    }

    fn extract_credential(&self, request: &Request) -> Option<String> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        request.header(self.header).map(str::to_string)
    }

    async fn resolve_user<P: UserProvider>(
        &self,
        credential: &String,
        provider: &P,
    ) -> Result<User, AuthFailure> {
        provider.load_user_by_username(credential).await
    }

    fn verify_credential(&self, _credential: &String, _user: &User) -> Result<(), AuthFailure> {
        Ok(())
    }

    fn mint_token(&self, user: &User, zone: &ZoneId) -> Token {
        match self.mint_for {
            Some(other) => Token::new(User::new(other, ""), zone.clone(), vec![]),
            None => Token::new(user.clone(), zone.clone(), user.roles().to_vec()),
        }
    }

    fn on_success(&self, _request: &mut Request, _token: &Token, _zone: &ZoneId) -> Option<Response> {
        self.respond.then(|| Response::new(StatusCode::OK, ""))
    }

    fn on_failure(&self, _request: &mut Request, _failure: &AuthFailure) -> Option<Response> {
        self.respond.then(|| Response::new(StatusCode::FORBIDDEN, ""))
    }

    fn supports_persistent_login(&self) -> bool {
        self.persistent
    }

    fn challenge(&self, _request: &mut Request, _failure: Option<&AuthFailure>) -> Response {
        Response::new(StatusCode::UNAUTHORIZED, "")
    }
}

fn probe_zone(ids: &[&str]) -> ZoneConfig {
    ZoneConfig::new("main", ids.iter().copied())
}

#[tokio::test]
async fn test_first_authenticator_with_credentials_wins() {
    let first = ProbeAuthenticator::new("X-FIRST");
    let second = ProbeAuthenticator::new("X-SECOND");
    let third = ProbeAuthenticator::new("X-THIRD");
    let (first_asked, third_asked) = (first.asked.clone(), third.asked.clone());

    let coordinator = GuardCoordinatorBuilder::new(probe_zone(&["first", "second", "third"]), blog_users())
        .authenticator("first", first)
        .authenticator("second", second)
        .authenticator("third", third)
        .build()
        .unwrap();

    // Both the second and third authenticators could claim this request.
    let mut request = Request::get("/")
        .with_header("X-SECOND", "anna")
        .with_header("X-THIRD", "jane_admin");
    let result = coordinator
        .handle(&mut request, &mut SecurityContext::new())
        .await
        .unwrap();

    assert_eq!(result.authenticator, Some(AuthenticatorId::new("second")));
    assert_eq!(result.token().map(Token::username), Some("anna"));
    assert_eq!(first_asked.load(Ordering::SeqCst), 1);
    assert_eq!(third_asked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_claim_does_not_fall_through() {
    let first = ProbeAuthenticator::new("X-FIRST");
    let second = ProbeAuthenticator::new("X-SECOND");
    let second_asked = second.asked.clone();

    let coordinator = GuardCoordinatorBuilder::new(probe_zone(&["first", "second"]), blog_users())
        .authenticator("first", first)
        .authenticator("second", second)
        .build()
        .unwrap();

    let mut request = Request::get("/")
        .with_header("X-FIRST", "mallory")
        .with_header("X-SECOND", "anna");
    let result = coordinator
        .handle(&mut request, &mut SecurityContext::new())
        .await
        .unwrap();

    assert_eq!(result.authenticator, Some(AuthenticatorId::new("first")));
    assert!(result.is_failure());
    assert_eq!(second_asked.load(Ordering::SeqCst), 0);
}

// =========================================================================
// Misconfiguration
// =========================================================================

#[tokio::test]
async fn test_token_minted_for_another_user_is_fatal() {
    let mut probe = ProbeAuthenticator::new("X-PROBE");
    probe.mint_for = Some("jane_admin");
    let coordinator = GuardCoordinatorBuilder::new(probe_zone(&["probe"]), blog_users())
        .authenticator("probe", probe)
        .build()
        .unwrap();
    let mut context = SecurityContext::new();

    let result = coordinator
        .handle(&mut Request::get("/").with_header("X-PROBE", "anna"), &mut context)
        .await;

    assert!(matches!(result, Err(GuardError::Misconfigured { .. })));
    assert!(!context.is_authenticated());
}

#[tokio::test]
async fn test_provider_rejects_unknown_guard_key() {
    let coordinator = coordinator();
    let provisional = ProvisionalToken::new(
        bastion_guard::GuardCredential::ApiToken(bastion_guard::ApiToken("ANNA_ABC".into())),
        "main_nonexistent",
        ZoneId::new("main"),
    );

    let result = coordinator.provider().authenticate(provisional).await;

    assert!(matches!(result, Err(GuardError::UnknownAuthenticator(key)) if key == "main_nonexistent"));
}

#[tokio::test]
async fn test_provider_rejects_token_from_other_zone() {
    let coordinator = coordinator();
    let provisional = ProvisionalToken::new(
        bastion_guard::GuardCredential::ApiToken(bastion_guard::ApiToken("ANNA_ABC".into())),
        "main_api_token",
        ZoneId::new("admin"),
    );

    let result = coordinator.provider().authenticate(provisional).await;

    assert!(matches!(result, Err(GuardError::UnknownAuthenticator(_))));
}

// =========================================================================
// Remember-me hook
// =========================================================================

/// Records calls and sets a marker cookie on success. Clones share counters.
#[derive(Clone, Default)]
struct RecordingRememberMe {
    successes: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

impl RememberMeServices for RecordingRememberMe {
    async fn login_success(&self, _request: &Request, response: &mut Response, token: &Token) {
        self.successes.fetch_add(1, Ordering::SeqCst);
        response.set_cookie(Cookie::new("REMEMBERME", token.username()));
    }

    async fn login_fail(&self, _request: &Request, response: &mut Response) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        response.set_cookie(Cookie::expired("REMEMBERME", "/"));
    }

    async fn auto_login<P: UserProvider>(&self, _request: &Request, _provider: &P) -> Option<User> {
        None
    }
}

fn remember_me_zone(ids: &[&str]) -> ZoneConfig {
    let mut config = probe_zone(ids);
    config.remember_me = true;
    config
}

#[tokio::test]
async fn test_remember_me_without_success_response_is_fatal() {
    let mut probe = ProbeAuthenticator::new("X-PROBE");
    probe.persistent = true;
    let services = RecordingRememberMe::default();
    let coordinator = GuardCoordinatorBuilder::new(remember_me_zone(&["probe"]), blog_users())
        .authenticator("probe", probe)
        .remember_me(services.clone())
        .build()
        .unwrap();
    let mut context = SecurityContext::new();

    let result = coordinator
        .handle(&mut Request::get("/").with_header("X-PROBE", "anna"), &mut context)
        .await;

    assert!(
        matches!(result, Err(GuardError::Misconfigured { authenticator, .. }) if authenticator.as_str() == "probe")
    );
    assert!(!context.is_authenticated());
    assert_eq!(services.successes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_remember_me_cookie_attached_to_success_response() {
    let mut probe = ProbeAuthenticator::new("X-PROBE");
    probe.persistent = true;
    probe.respond = true;
    let services = RecordingRememberMe::default();
    let coordinator = GuardCoordinatorBuilder::new(remember_me_zone(&["probe"]), blog_users())
        .authenticator("probe", probe)
        .remember_me(services.clone())
        .build()
        .unwrap();

    let result = coordinator
        .handle(&mut Request::get("/").with_header("X-PROBE", "anna"), &mut SecurityContext::new())
        .await
        .unwrap();

    let response = result.response.expect("probe responds");
    assert_eq!(response.cookie("REMEMBERME").map(|c| c.value.as_str()), Some("anna"));
    assert_eq!(services.successes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_remember_me_cancelled_on_failure() {
    let mut probe = ProbeAuthenticator::new("X-PROBE");
    probe.respond = true;
    let services = RecordingRememberMe::default();
    let coordinator = GuardCoordinatorBuilder::new(remember_me_zone(&["probe"]), blog_users())
        .authenticator("probe", probe)
        .remember_me(services.clone())
        .build()
        .unwrap();

    let result = coordinator
        .handle(&mut Request::get("/").with_header("X-PROBE", "mallory"), &mut SecurityContext::new())
        .await
        .unwrap();

    let response = result.response.expect("probe responds");
    assert!(response.cookie("REMEMBERME").is_some_and(Cookie::is_cleared));
    assert_eq!(services.failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_remember_me_skipped_when_zone_does_not_enable_it() {
    let mut probe = ProbeAuthenticator::new("X-PROBE");
    probe.persistent = true;
    let services = RecordingRememberMe::default();
    let coordinator = GuardCoordinatorBuilder::new(probe_zone(&["probe"]), blog_users())
        .authenticator("probe", probe)
        .remember_me(services.clone())
        .build()
        .unwrap();

    let result = coordinator
        .handle(&mut Request::get("/").with_header("X-PROBE", "anna"), &mut SecurityContext::new())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(services.successes.load(Ordering::SeqCst), 0);
}

// =========================================================================
// Context across requests / concurrency
// =========================================================================

#[tokio::test]
async fn test_context_survives_session_round_trip() {
    let coordinator = coordinator();
    let zone = coordinator.zone().clone();
    let mut request = login_post("anna", "kitten");
    let mut context = SecurityContext::new();
    coordinator.handle(&mut request, &mut context).await.unwrap();

    context.persist(request.session_mut(), &zone).unwrap();
    let next = Request::get("/admin/post/").with_session(request.into_session());
    let restored = SecurityContext::load(next.session(), &zone).unwrap();

    assert_eq!(restored, context);
    assert_eq!(restored.token().map(Token::username), Some("anna"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_do_not_share_contexts() {
    let coordinator = Arc::new(coordinator());

    let mut handles = Vec::new();
    for i in 0..32 {
        let coordinator = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            let mut request = if i % 2 == 0 {
                Request::get("/admin/post/").with_header("X-AUTH-TOKEN", "ANNA_ABC")
            } else {
                login_post("jane_admin", "wrong")
            };
            let mut context = SecurityContext::new();
            let result = coordinator.handle(&mut request, &mut context).await.unwrap();
            (i, result.outcome, context)
        }));
    }

    for handle in handles {
        let (i, outcome, context) = handle.await.unwrap();
        if i % 2 == 0 {
            assert!(matches!(outcome, Outcome::Success(_)));
            assert_eq!(context.token().map(Token::username), Some("anna"));
        } else {
            assert_eq!(outcome, Outcome::Failure(AuthFailure::BadCredentials));
            assert!(context.token().is_none());
        }
    }
}
