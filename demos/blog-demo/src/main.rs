use bastion::prelude::*;

// ---------------------------------------------------------------------------
// Blog users and zones
// ---------------------------------------------------------------------------

const USERS: &str = r#"[
    { "username": "jane_admin", "password": "kitten", "roles": ["ROLE_ADMIN"] },
    { "username": "anna", "password": "kitten", "roles": ["ROLE_ADMIN"], "api_token": "ANNA_ABC" },
    { "username": "tom_user", "password": "kitten", "roles": ["ROLE_USER"] }
]"#;

const ZONE: &str = r#"{
    "name": "main",
    "authenticators": ["form_login", "api_token"],
    "provider": "in_memory",
    "entry_point": "form_login",
    "remember_me": true
}"#;

type BlogFirewall = Firewall<InMemoryUserProvider, GuardAuthenticator, TokenRememberMeServices>;

fn blog_firewall() -> Result<BlogFirewall, BastionError> {
    let coordinator = GuardCoordinator::builder(
        ZoneConfig::from_json(ZONE)?,
        InMemoryUserProvider::from_json(USERS)?,
    )
    .authenticator(
        "form_login",
        GuardAuthenticator::form_login(FormLoginOptions::default(), PlaintextPasswordVerifier),
    )
    .authenticator("api_token", GuardAuthenticator::header_token(HeaderTokenOptions::default()))
    .remember_me(TokenRememberMeServices::new(RememberMeConfig::default()))
    .build()?;
    Ok(Firewall::new(coordinator))
}

// ---------------------------------------------------------------------------
// A broken authenticator: asks for remember-me but never answers
// ---------------------------------------------------------------------------

struct SilentLogin;

impl Authenticator for SilentLogin {
    type Credential = String;

    fn kind(&self) -> &'static str {
        "silent_login"
    }

    fn extract_credential(&self, request: &Request) -> Option<String> {
        request.header("X-SILENT-USER").map(str::to_string)
    }

    async fn resolve_user<P: UserProvider>(&self, username: &String, users: &P) -> Result<User, AuthFailure> {
        users.load_user_by_username(username).await
    }

    fn verify_credential(&self, _: &String, _: &User) -> Result<(), AuthFailure> {
        Ok(())
    }

    fn on_success(&self, _: &mut Request, _: &Token, _: &ZoneId) -> Option<Response> {
        None
    }

    fn on_failure(&self, _: &mut Request, _: &AuthFailure) -> Option<Response> {
        None
    }

    fn supports_persistent_login(&self) -> bool {
        true
    }

    fn challenge(&self, _: &mut Request, _: Option<&AuthFailure>) -> Response {
        Response::new(StatusCode::UNAUTHORIZED, "")
    }
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

fn describe(result: &GuardResult) -> String {
    let who = result
        .authenticator
        .as_ref()
        .map_or("-".to_string(), ToString::to_string);
    let outcome = match &result.outcome {
        Outcome::Success(token) => format!("success as {}", token.username()),
        Outcome::Failure(failure) => format!("failure ({})", failure.message_key()),
        Outcome::Skip => "skipped".to_string(),
    };
    let response = match &result.response {
        Some(r) => match r.location() {
            Some(location) => format!("{} -> {location}", r.status().as_u16()),
            None => format!("{} {}", r.status().as_u16(), r.body()),
        },
        None => "continue".to_string(),
    };
    format!("[{who}] {outcome}; response: {response}")
}

#[tokio::main]
async fn main() -> Result<(), BastionError> {
    init_tracing();
    walkthrough(&blog_firewall()?).await
}

/// Runs scenarios A to F, logging one event per step.
async fn walkthrough(firewall: &BlogFirewall) -> Result<(), BastionError> {
    // A: API token
    let mut request = Request::get("/admin/post/").with_header("X-AUTH-TOKEN", "ANNA_ABC");
    let result = firewall.handle(&mut request, &mut SecurityContext::new()).await?;
    tracing::info!(scenario = "A", result = %describe(&result), "header token ok");

    // B: nothing to authenticate with
    let mut request = Request::get("/blog/");
    let result = firewall.handle(&mut request, &mut SecurityContext::new()).await?;
    tracing::info!(scenario = "B", result = %describe(&result), "no credentials");

    // C: unknown API token
    let mut request = Request::get("/admin/post/").with_header("X-AUTH-TOKEN", "EVE_XYZ");
    let result = firewall.handle(&mut request, &mut SecurityContext::new()).await?;
    tracing::info!(scenario = "C", result = %describe(&result), "header token bad");

    // D: visit a protected page, get sent to the form, log in
    let mut protected = Request::get("/admin/post/");
    let challenge = firewall.challenge(&mut protected)?;
    tracing::info!(
        scenario = "D",
        status = challenge.status().as_u16(),
        location = challenge.location().unwrap_or("-"),
        "challenge"
    );
    let mut login = Request::post("/login_check")
        .with_form_field("_username", "jane_admin")
        .with_form_field("_password", "kitten")
        .with_form_field("_remember_me", "on")
        .with_session(protected.into_session());
    let (_, result) = firewall.handle_session(&mut login).await?;
    tracing::info!(scenario = "D", result = %describe(&result), "form login ok");
    let remember_me = result.response.as_ref().and_then(|r| r.cookie("REMEMBERME")).cloned();

    // D': a new browser session, only the remember-me cookie is left
    if let Some(cookie) = remember_me {
        let mut request = Request::get("/admin/post/")
            .with_header("Cookie", format!("{}={}", cookie.name, cookie.value));
        let result = firewall.handle(&mut request, &mut SecurityContext::new()).await?;
        tracing::info!(scenario = "D", result = %describe(&result), "remember-me login");
    }

    // E: wrong password
    let mut login = Request::post("/login_check")
        .with_form_field("_username", "jane_admin")
        .with_form_field("_password", "puppy");
    let result = firewall.handle(&mut login, &mut SecurityContext::new()).await?;
    tracing::info!(scenario = "E", result = %describe(&result), "form login bad");
    if let Ok(Some(error)) = login.session().get::<serde_json::Value>(LAST_ERROR) {
        tracing::info!(scenario = "E", %error, "last error in session");
    }

    // F: remember-me without a response to attach the cookie to
    let mut zone = ZoneConfig::new("silent", ["silent_login"]);
    zone.remember_me = true;
    let silent = silent_firewall(zone)?;
    let mut request = Request::get("/").with_header("X-SILENT-USER", "anna");
    match silent.handle(&mut request, &mut SecurityContext::new()).await {
        Ok(result) => tracing::warn!(scenario = "F", result = %describe(&result), "broken authenticator was accepted"),
        Err(e) => tracing::info!(scenario = "F", error = %e, "broken authenticator refused"),
    }

    Ok(())
}

fn silent_firewall(
    zone: ZoneConfig,
) -> Result<Firewall<InMemoryUserProvider, SilentLogin, TokenRememberMeServices>, BastionError> {
    let coordinator = GuardCoordinatorBuilder::new(zone, InMemoryUserProvider::from_json(USERS)?)
        .authenticator("silent_login", SilentLogin)
        .remember_me(TokenRememberMeServices::new(RememberMeConfig::default()))
        .build()?;
    Ok(Firewall::new(coordinator))
}
