//! The inbound request abstraction.
//!
//! A [`Request`] carries exactly what authenticators need to look for
//! credentials: the method, the path, headers, submitted form fields, and
//! the connection's [`Session`]. Bodies other than form fields are the
//! host framework's business.

use std::collections::HashMap;

use http::header::{COOKIE, HeaderName, HeaderValue};
use http::request::Parts;
use http::{HeaderMap, Method};

use crate::Session;

/// An inbound request as seen by the authentication pipeline.
///
/// Built with the constructor helpers and `with_*` methods:
///
/// ```rust
/// use bastion_http::Request;
///
/// let request = Request::post("/login_check")
///     .with_form_field("_username", "anna")
///     .with_form_field("_password", "kitten");
///
/// assert_eq!(request.form_field("_username"), Some("anna"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    form: HashMap<String, String>,
    session: Session,
}

impl Request {
    /// Creates a request with no headers, no form fields, and an empty session.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            form: HashMap::new(),
            session: Session::new(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Takes method, path, and headers from the host framework's request
    /// head. Form fields are decoded by the host and added with
    /// [`with_form_field`](Self::with_form_field).
    pub fn from_parts(parts: Parts) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            headers: parts.headers,
            form: HashMap::new(),
            session: Session::new(),
        }
    }

    /// Appends a header and returns the request.
    ///
    /// A name or value that isn't valid HTTP is skipped; no client could
    /// have sent it.
    pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        match (name.try_into(), value.try_into()) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::debug!("skipping header that isn't valid HTTP"),
        }
        self
    }

    /// Adds a submitted form field and returns the request.
    pub fn with_form_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    /// Attaches an existing session (e.g. one carried over from the
    /// previous request on the same connection).
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path component of the request URI, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the first value of a header, case-insensitively.
    ///
    /// Values that aren't visible ASCII read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a submitted form field.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    /// Looks up a cookie by name across every `Cookie` header.
    ///
    /// The `Cookie` header is a `; `-separated list of `name=value`
    /// pairs. Malformed pairs (no `=`) are ignored.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Consumes the request and hands back its session so the host can
    /// persist it for the next request.
    pub fn into_session(self) -> Session {
        self.session
    }
}
