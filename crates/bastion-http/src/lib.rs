//! HTTP-like request and response types for Bastion.
//!
//! Bastion doesn't run an HTTP server. It sits *inside* one: the host
//! application converts its framework's request into a [`Request`], hands
//! it to the authentication pipeline, and converts any [`Response`] the
//! pipeline produced back into its framework's response type.
//!
//! This crate defines that boundary:
//!
//! - **Request** ([`Request`]): what the authenticators read credentials
//!   from. Methods, headers, and status codes are the [`http`] crate's.
//! - **Response** ([`Response`], [`Cookie`]): what success, failure, and
//!   challenge handlers produce.
//! - **Session** ([`Session`]): the mutable per-connection store that
//!   survives between requests (target paths, last login error, ...).
//! - **Errors** ([`HttpError`]): what can go wrong reading or writing
//!   session values, or handing a response back to the host.
//!
//! # Architecture
//!
//! ```text
//! Host framework → Request → Guard pipeline → Option<Response> → Host framework
//! ```

mod error;
mod request;
mod response;
mod session;

pub use error::HttpError;
pub use http::{HeaderMap, Method, StatusCode, header};
pub use request::Request;
pub use response::{Cookie, Response};
pub use session::Session;
