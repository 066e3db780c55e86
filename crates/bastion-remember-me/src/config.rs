//! Remember-me cookie settings.

use serde::{Deserialize, Serialize};

/// How the remember-me cookie is issued and how long it stays valid.
///
/// Every field has a default, so a config file only needs to name the
/// ones it changes:
///
/// ```json
/// { "lifetime_secs": 604800, "secure": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RememberMeConfig {
    pub cookie_name: String,

    /// How long (in seconds) an issued token can be redeemed.
    ///
    /// Default: one year. `0` makes every token expire immediately.
    pub lifetime_secs: u64,

    pub path: String,
    pub secure: bool,
    pub http_only: bool,

    /// Remember every successful login, without asking.
    pub always_remember_me: bool,

    /// Login form field that opts in to being remembered.
    pub remember_me_parameter: String,
}

impl Default for RememberMeConfig {
    fn default() -> Self {
        Self {
            cookie_name: "REMEMBERME".to_string(),
            lifetime_secs: 31_536_000,
            path: "/".to_string(),
            secure: false,
            http_only: true,
            always_remember_me: false,
            remember_me_parameter: "_remember_me".to_string(),
        }
    }
}
