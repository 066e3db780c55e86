//! The persistent-login ("remember me") hook.
//!
//! The guard pipeline decides *when* a persistent login artifact should
//! be issued or cancelled. What the artifact looks like (a signed cookie,
//! a database-backed series token) is up to the [`RememberMeServices`]
//! implementation bound to the zone.

use std::future::Future;

use bastion_http::{Request, Response};
use bastion_user::{User, UserProvider};

use crate::Token;

/// Issues, cancels, and redeems persistent login artifacts.
pub trait RememberMeServices: Send + Sync + 'static {
    /// Called after a successful interactive login. May attach an artifact
    /// (typically a cookie) to `response`.
    fn login_success(
        &self,
        request: &Request,
        response: &mut Response,
        token: &Token,
    ) -> impl Future<Output = ()> + Send;

    /// Called after a failed login. Should cancel any artifact the client
    /// still holds.
    fn login_fail(&self, request: &Request, response: &mut Response) -> impl Future<Output = ()> + Send;

    /// Called on logout. Cancels the artifact like a failed login does.
    fn logout(&self, request: &Request, response: &mut Response) -> impl Future<Output = ()> + Send {
        self.login_fail(request, response)
    }

    /// Tries to re-authenticate a visitor from an artifact in `request`.
    /// Returns `None` when there is none or it's no longer valid.
    fn auto_login<P: UserProvider>(
        &self,
        request: &Request,
        provider: &P,
    ) -> impl Future<Output = Option<User>> + Send;
}

/// The remember-me service of a zone that has none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRememberMe;

impl RememberMeServices for NoRememberMe {
    async fn login_success(&self, _request: &Request, _response: &mut Response, _token: &Token) {}

    async fn login_fail(&self, _request: &Request, _response: &mut Response) {}

    async fn auto_login<P: UserProvider>(&self, _request: &Request, _provider: &P) -> Option<User> {
        None
    }
}
