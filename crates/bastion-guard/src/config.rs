//! Zone configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{AuthenticatorId, GuardError, ZoneId};

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// ZoneConfig
// ---------------------------------------------------------------------------

/// Configuration for one protected zone.
///
/// Usually deserialized from the application's security configuration:
///
/// ```json
/// {
///     "name": "main",
///     "authenticators": ["form_login", "api_token"],
///     "provider": "database_users",
///     "entry_point": "form_login",
///     "remember_me": true
/// }
/// ```
///
/// A single authenticator may also be given under the key
/// `"authenticator"`, which some configuration formats produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone name. Also the prefix of every guard key.
    pub name: String,

    /// Authenticator ids in the order they get to inspect requests.
    /// Order matters: the first one that finds credentials wins.
    #[serde(alias = "authenticator")]
    pub authenticators: Vec<String>,

    /// Name of the user provider bound to the zone. Informational: the
    /// provider instance itself is passed to the builder.
    #[serde(default)]
    pub provider: Option<String>,

    /// The authenticator that starts authentication (login redirect, 401)
    /// when an anonymous visitor hits a protected page. Optional when the
    /// zone has exactly one authenticator.
    #[serde(default)]
    pub entry_point: Option<String>,

    /// Whether successful logins may trigger persistent ("remember me")
    /// login. Only takes effect when a remember-me service is also bound.
    #[serde(default)]
    pub remember_me: bool,

    /// Report unknown usernames as bad credentials so responses can't be
    /// used to enumerate accounts.
    #[serde(default = "default_true")]
    pub hide_user_not_found: bool,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            authenticators: Vec::new(),
            provider: None,
            entry_point: None,
            remember_me: false,
            hide_user_not_found: true,
        }
    }
}

impl ZoneConfig {
    /// Creates a config with the given name and authenticator ids and
    /// default settings for everything else.
    pub fn new<I, S>(name: impl Into<String>, authenticators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            authenticators: authenticators.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parses and validates a JSON zone configuration.
    ///
    /// # Errors
    /// [`GuardError::InvalidConfig`] for malformed JSON or a config that
    /// fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, GuardError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GuardError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the coordinator relies on.
    ///
    /// - the name is not empty
    /// - at least one authenticator is listed
    /// - authenticator ids are unique
    /// - `entry_point`, if set, is one of the listed authenticators
    pub fn validate(&self) -> Result<(), GuardError> {
        if self.name.trim().is_empty() {
            return Err(GuardError::InvalidConfig("zone name must not be empty".into()));
        }
        if self.authenticators.is_empty() {
            return Err(GuardError::InvalidConfig(format!(
                "zone {} must list at least one authenticator",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for id in &self.authenticators {
            if id.trim().is_empty() {
                return Err(GuardError::InvalidConfig(format!(
                    "zone {} has an empty authenticator id",
                    self.name
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(GuardError::InvalidConfig(format!(
                    "authenticator {id} is listed twice in zone {}",
                    self.name
                )));
            }
        }
        if let Some(entry_point) = &self.entry_point {
            if !seen.contains(entry_point.as_str()) {
                return Err(GuardError::InvalidConfig(format!(
                    "entry_point {entry_point} is not an authenticator of zone {}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    pub fn zone_id(&self) -> ZoneId {
        ZoneId::new(self.name.clone())
    }

    pub fn authenticator_ids(&self) -> impl Iterator<Item = AuthenticatorId> + '_ {
        self.authenticators.iter().map(|id| AuthenticatorId::new(id.clone()))
    }
}
