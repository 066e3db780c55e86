//! Username/password login through an HTML form.

use bastion_http::{Method, Request, Response};
use bastion_user::{AuthFailure, PasswordVerifier, User, UserProvider};
use serde::{Deserialize, Serialize};

use crate::context::{LAST_ERROR, LAST_USERNAME, target_path_key};
use crate::{Authenticator, Token, UsernamePassword, ZoneId};

/// Where the login form lives and what its fields are called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormLoginOptions {
    /// The path the form posts to. Only `POST`s to this path are login
    /// attempts; every other request is skipped.
    pub check_path: String,
    /// The page showing the form. Failures and challenges redirect here.
    pub login_path: String,
    /// Where to go after login when no target path was recorded.
    pub default_target_path: String,
    pub username_parameter: String,
    pub password_parameter: String,
    /// Form field that may carry an explicit post-login target.
    pub target_path_parameter: String,
    /// Whether successful logins may issue a remember-me cookie.
    pub remember_me: bool,
}

impl Default for FormLoginOptions {
    fn default() -> Self {
        Self {
            check_path: "/login_check".to_string(),
            login_path: "/login".to_string(),
            default_target_path: "/".to_string(),
            username_parameter: "_username".to_string(),
            password_parameter: "_password".to_string(),
            target_path_parameter: "_target_path".to_string(),
            remember_me: true,
        }
    }
}

/// Authenticates a username and password posted to
/// [`check_path`](FormLoginOptions::check_path).
///
/// - success → redirect to the remembered target path (or the default)
/// - failure → store the failure in the session, redirect to the form
/// - challenge → redirect to the form
pub struct FormLoginAuthenticator {
    options: FormLoginOptions,
    verifier: Box<dyn PasswordVerifier>,
}

impl FormLoginAuthenticator {
    pub fn new(options: FormLoginOptions, verifier: impl PasswordVerifier) -> Self {
        Self {
            options,
            verifier: Box::new(verifier),
        }
    }

    pub fn options(&self) -> &FormLoginOptions {
        &self.options
    }

    fn posted_target(&self, request: &Request) -> Option<String> {
        request
            .form_field(&self.options.target_path_parameter)
            .filter(|path| is_local_path(path))
            .map(str::to_string)
    }

    fn posted_username(&self, request: &Request) -> String {
        request
            .form_field(&self.options.username_parameter)
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

/// Returns `true` for an absolute path on this site.
///
/// Browsers read `\` as `/` and drop tabs and newlines, so `/\host` and
/// `/\t/host` are as off-site as `//host`.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

impl Authenticator for FormLoginAuthenticator {
    type Credential = UsernamePassword;

    fn kind(&self) -> &'static str {
        "form_login"
    }

    fn extract_credential(&self, request: &Request) -> Option<UsernamePassword> {
        if request.path() != self.options.check_path || *request.method() != Method::POST {
            return None;
        }

        // Missing fields still count as an attempt: the user submitted
        // the form, they just left something empty.
        let username = self.posted_username(request);
        let password = request
            .form_field(&self.options.password_parameter)
            .unwrap_or_default()
            .to_string();

        Some(UsernamePassword { username, password })
    }

    async fn resolve_user<P: UserProvider>(
        &self,
        credential: &UsernamePassword,
        provider: &P,
    ) -> Result<User, AuthFailure> {
        if credential.username.is_empty() {
            return Err(AuthFailure::UserNotFound(String::new()));
        }
        provider.load_user_by_username(&credential.username).await
    }

    fn verify_credential(&self, credential: &UsernamePassword, user: &User) -> Result<(), AuthFailure> {
        self.verifier.verify(&credential.password, user)
    }

    fn on_success(&self, request: &mut Request, _token: &Token, zone: &ZoneId) -> Option<Response> {
        let posted = self.posted_target(request);
        let session = request.session_mut();
        session.remove(LAST_ERROR);

        let stored: Option<String> = session.take(&target_path_key(zone)).ok().flatten();
        let target = stored
            .or(posted)
            .unwrap_or_else(|| self.options.default_target_path.clone());

        Some(Response::redirect(target))
    }

    fn on_failure(&self, request: &mut Request, failure: &AuthFailure) -> Option<Response> {
        let username = request
            .form_field(&self.options.username_parameter)
            .map(|_| self.posted_username(request));
        let session = request.session_mut();

        if let Err(e) = session.set(LAST_ERROR, failure) {
            tracing::warn!(error = %e, "could not store last authentication error");
        }
        if let Some(username) = username {
            if let Err(e) = session.set(LAST_USERNAME, &username) {
                tracing::warn!(error = %e, "could not store last username");
            }
        }

        Some(Response::redirect(self.options.login_path.clone()))
    }

    fn supports_persistent_login(&self) -> bool {
        self.options.remember_me
    }

    fn challenge(&self, _request: &mut Request, _failure: Option<&AuthFailure>) -> Response {
        Response::redirect(self.options.login_path.clone())
    }
}
