//! Identity types shared across Dicecup.
//!
//! All three are newtype wrappers so a session id can never be passed
//! where a user token is expected, even though both are strings
//! underneath. `#[serde(transparent)]` keeps them as bare values on the
//! wire: `SessionId("ab12")` is just `"ab12"` in JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque identifier of one game session.
///
/// Sessions are created with short random ids (see the controller); any
/// non-empty string is a valid id as far as the lower layers care.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw id without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses an id supplied by a client, rejecting empty or
    /// slash-containing values (they can't appear in a request path).
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if raw.is_empty() || raw.contains('/') {
            return Err(ProtocolError::InvalidValue(format!(
                "invalid session id {raw:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Opaque token identifying an authenticated user.
///
/// The transport layer extracts it (e.g. from basic auth) and hands it to
/// the controller; the core only ever compares tokens for equality.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw user token.
    pub fn new(user: impl Into<String>) -> Self {
        Self(user.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(user: &str) -> Self {
        Self::new(user)
    }
}

// ---------------------------------------------------------------------------
// ObserverId
// ---------------------------------------------------------------------------

/// Identifies one observer (one live connection watching a session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverId(pub u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionId::new("ab12")).unwrap();
        assert_eq!(json, "\"ab12\"");
    }

    #[test]
    fn test_session_id_parse_rejects_empty() {
        assert!(SessionId::parse("").is_err());
    }

    #[test]
    fn test_session_id_parse_rejects_slash() {
        assert!(SessionId::parse("ab/12").is_err());
    }

    #[test]
    fn test_session_id_parse_accepts_plain_id() {
        let id = SessionId::parse("x9k2").unwrap();
        assert_eq!(id.as_str(), "x9k2");
    }

    #[test]
    fn test_user_id_deserializes_from_plain_string() {
        let user: UserId = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(user, UserId::from("alice"));
    }

    #[test]
    fn test_observer_id_display() {
        assert_eq!(ObserverId(7).to_string(), "O-7");
    }
}
