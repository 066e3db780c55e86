//! Error types for the HTTP layer.

/// Errors that can occur while reading or writing request-scoped data.
///
/// Session values are stored as JSON so that any serde type can be kept
/// between requests; encoding or decoding them can fail. So can handing
/// a response back to the host when a cookie isn't a valid header value.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// A value could not be serialized into the session.
    #[error("session encode failed for key {key}: {source}")]
    SessionEncode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored session value doesn't match the requested type.
    ///
    /// Usually means two parts of the application wrote different types
    /// under the same key.
    #[error("session decode failed for key {key}: {source}")]
    SessionDecode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A cookie rendered to bytes that can't go in a `Set-Cookie` header.
    #[error("cookie {name} is not a valid header value: {source}")]
    InvalidCookie {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
}
