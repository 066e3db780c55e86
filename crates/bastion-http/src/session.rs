//! The per-connection session store.
//!
//! A session outlives a single request: the login form's failure handler
//! writes the last error here, and the next `GET /login` reads it back.
//! Values are kept as JSON so any serde type can be stored without this
//! crate knowing about it.

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};

use crate::HttpError;

/// A mutable key/value store attached to a client connection.
///
/// Storage (cookies, Redis, memory) is the host framework's concern; it
/// hands a `Session` in with each request and takes it back afterwards
/// via [`Request::into_session`](crate::Request::into_session).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    attributes: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing whatever was there.
    ///
    /// # Errors
    /// Returns [`HttpError::SessionEncode`] if `value` can't be represented
    /// as JSON.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), HttpError> {
        let encoded = serde_json::to_value(value).map_err(|source| HttpError::SessionEncode {
            key: key.to_string(),
            source,
        })?;
        self.attributes.insert(key.to_string(), encoded);
        Ok(())
    }

    /// Reads the value under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    /// Returns [`HttpError::SessionDecode`] if the stored value isn't a `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, HttpError> {
        self.attributes
            .get(key)
            .map(|value| {
                T::deserialize(value).map_err(|source| HttpError::SessionDecode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Shorthand for reading a string value. Non-string values read as `None`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(serde_json::Value::as_str)
    }

    /// Removes `key` and returns its decoded value.
    ///
    /// The key is removed even if decoding fails.
    pub fn take<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, HttpError> {
        self.attributes
            .remove(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|source| HttpError::SessionDecode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Removes `key`. Returns `true` if something was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.attributes.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Drops every attribute (e.g. on logout).
    pub fn clear(&mut self) {
        self.attributes.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct LastError {
        key: String,
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let mut session = Session::new();
        session
            .set("_security.last_error", &LastError { key: "Invalid credentials.".into() })
            .unwrap();

        let read: Option<LastError> = session.get("_security.last_error").unwrap();

        assert_eq!(read, Some(LastError { key: "Invalid credentials.".into() }));
    }

    #[test]
    fn test_get_missing_key_returns_none() {
        let session = Session::new();

        let read: Option<String> = session.get("nope").unwrap();

        assert!(read.is_none());
    }

    #[test]
    fn test_get_wrong_type_returns_decode_error() {
        let mut session = Session::new();
        session.set("count", &3).unwrap();

        let result: Result<Option<LastError>, _> = session.get("count");

        assert!(matches!(result, Err(HttpError::SessionDecode { key, .. }) if key == "count"));
    }

    #[test]
    fn test_take_removes_key() {
        let mut session = Session::new();
        session.set("_security.main.target_path", &"/admin/post/").unwrap();

        let taken: Option<String> = session.take("_security.main.target_path").unwrap();

        assert_eq!(taken.as_deref(), Some("/admin/post/"));
        assert!(!session.contains("_security.main.target_path"));
    }

    #[test]
    fn test_get_str_ignores_non_strings() {
        let mut session = Session::new();
        session.set("name", &"anna").unwrap();
        session.set("flag", &true).unwrap();

        assert_eq!(session.get_str("name"), Some("anna"));
        assert_eq!(session.get_str("flag"), None);
    }

    #[test]
    fn test_clear_empties_session() {
        let mut session = Session::new();
        session.set("a", &1).unwrap();
        session.set("b", &2).unwrap();
        assert_eq!(session.len(), 2);

        session.clear();

        assert!(session.is_empty());
    }
}
