//! The outbound response abstraction.
//!
//! Authenticators produce a [`Response`] when they want to short-circuit
//! the request: redirect to a login form, answer with a JSON error, or
//! confirm a login. Remember-me services attach [`Cookie`]s to it.

use http::header::{CONTENT_TYPE, HeaderValue, LOCATION, SET_COOKIE};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::HttpError;

// ---------------------------------------------------------------------------
// Cookie
// ---------------------------------------------------------------------------

/// A cookie to be sent back to the client via `Set-Cookie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// Lifetime in seconds. `Some(0)` tells the client to delete it,
    /// `None` makes it a session cookie.
    pub max_age: Option<u64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    /// Creates a session cookie scoped to `/` and hidden from scripts.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
            secure: false,
            http_only: true,
        }
    }

    /// Creates a cookie that instructs the client to drop `name`.
    pub fn expired(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            path: path.into(),
            max_age: Some(0),
            secure: false,
            http_only: true,
        }
    }

    /// Returns `true` if this cookie deletes rather than sets a value.
    pub fn is_cleared(&self) -> bool {
        self.max_age == Some(0)
    }

    /// Renders the `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A response produced by the authentication pipeline.
///
/// The pipeline never writes to the network itself; the host framework
/// takes it apart with [`into_http`](Self::into_http).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    cookies: Vec<Cookie>,
}

impl Response {
    /// Creates a response with the given status and body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            cookies: Vec::new(),
        }
    }

    /// Creates a `302 Found` redirect to `location`.
    ///
    /// A location that can't be sent as a header value (control
    /// characters) redirects to `/` instead.
    pub fn redirect(location: impl Into<String>) -> Self {
        let location = HeaderValue::try_from(location.into())
            .unwrap_or_else(|_| HeaderValue::from_static("/"));
        let mut response = Self::new(StatusCode::FOUND, "");
        response.headers.insert(LOCATION, location);
        response
    }

    /// Serializes `value` as the JSON body and sets the content type.
    ///
    /// Falls back to an empty JSON object if `value` can't be serialized
    /// (only possible for maps with non-string keys and the like). The
    /// status is still honoured so the client sees the right outcome.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
        let mut response = Self::new(status, body);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the redirect target for 3xx responses.
    pub fn location(&self) -> Option<&str> {
        if self.status.is_redirection() {
            self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
        } else {
            None
        }
    }

    /// Adds a cookie, replacing any earlier cookie with the same name.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }

    /// Returns the cookie with this name, if one was set.
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Converts into an [`http::Response`], adding one `Set-Cookie`
    /// header per cookie.
    ///
    /// # Errors
    /// [`HttpError::InvalidCookie`] if a cookie renders to something that
    /// isn't a valid header value.
    pub fn into_http(self) -> Result<http::Response<String>, HttpError> {
        let mut headers = self.headers;
        for cookie in &self.cookies {
            let value = HeaderValue::try_from(cookie.to_header_value()).map_err(|source| {
                HttpError::InvalidCookie {
                    name: cookie.name.clone(),
                    source,
                }
            })?;
            headers.append(SET_COOKIE, value);
        }

        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
