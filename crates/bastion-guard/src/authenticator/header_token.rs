//! API token authentication through a request header.

use bastion_http::{Request, Response, StatusCode};
use bastion_user::{AuthFailure, User, UserProvider};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{ApiToken, Authenticator, Token, ZoneId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderTokenOptions {
    /// Header carrying the token. Matched case-insensitively.
    pub header: String,
}

impl Default for HeaderTokenOptions {
    fn default() -> Self {
        Self {
            header: "X-AUTH-TOKEN".to_string(),
        }
    }
}

/// Authenticates requests carrying an API token header.
///
/// Stateless: the token is checked on every request and a successful
/// check lets the request through without a response. Failures answer
/// `403` with the failure's message key; challenges answer `401`.
#[derive(Debug, Clone, Default)]
pub struct HeaderTokenAuthenticator {
    options: HeaderTokenOptions,
}

impl HeaderTokenAuthenticator {
    pub fn new(options: HeaderTokenOptions) -> Self {
        Self { options }
    }
}

impl Authenticator for HeaderTokenAuthenticator {
    type Credential = ApiToken;

    fn kind(&self) -> &'static str {
        "header_token"
    }

    fn extract_credential(&self, request: &Request) -> Option<ApiToken> {
        request
            .header(&self.options.header)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| ApiToken(token.to_string()))
    }

    async fn resolve_user<P: UserProvider>(
        &self,
        credential: &ApiToken,
        provider: &P,
    ) -> Result<User, AuthFailure> {
        provider.load_user_by_token(&credential.0).await
    }

    // The provider found the user *by* this token, but a provider doing
    // prefix or case-insensitive matching must not widen what's accepted.
    fn verify_credential(&self, credential: &ApiToken, user: &User) -> Result<(), AuthFailure> {
        match user.api_token() {
            Some(stored) if stored == credential.0 => Ok(()),
            _ => Err(AuthFailure::BadCredentials),
        }
    }

    fn on_success(&self, _request: &mut Request, _token: &Token, _zone: &ZoneId) -> Option<Response> {
        None
    }

    fn on_failure(&self, _request: &mut Request, failure: &AuthFailure) -> Option<Response> {
        Some(Response::json(StatusCode::FORBIDDEN, &json!({ "message": failure.message_key() })))
    }

    fn challenge(&self, _request: &mut Request, _failure: Option<&AuthFailure>) -> Response {
        Response::json(StatusCode::UNAUTHORIZED, &json!({ "message": "Authentication Required" }))
    }
}
