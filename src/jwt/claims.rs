use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::IssueError;

/// Issued at claim name.
pub const ISSUED_AT: &str = "iat";
/// Expiration time claim name.
pub const EXPIRATION: &str = "exp";
/// JWT ID claim name.
pub const JWT_ID: &str = "jti";

/// Claims of a token being issued. Names are unique, inserting an existing one
/// replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies the issuance directives, overriding any caller supplied `iat`, `exp`
    /// or `jti` they target. `now` is the issuance time.
    pub fn apply(
        mut self,
        directives: &IssuanceDirectives,
        now: DateTime<Utc>,
    ) -> Result<Self, IssueError> {
        let issued_at = now.timestamp();

        if directives.set_issued_at {
            self.insert(ISSUED_AT, issued_at);
        }

        if let Some(ttl) = directives.ttl_seconds {
            // A zero or negative ttl yields an already expired token.
            let expires_at = TimeDelta::try_seconds(ttl)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| IssueError::Input(format!("ttl `{ttl}` is out of range")))?;
            self.insert(EXPIRATION, expires_at.timestamp());
        }

        if directives.set_unique_id {
            self.insert(JWT_ID, Uuid::new_v4().to_string());
        }

        Ok(self)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

impl TryFrom<Value> for ClaimSet {
    type Error = IssueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(claims) => Ok(Self(claims)),
            Value::Null => Ok(Self::default()),
            other => Err(IssueError::Input(format!(
                "claims must be a JSON object, got `{other}`"
            ))),
        }
    }
}

/// How the issuer completes the caller supplied claims.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuanceDirectives {
    /// Set `iat` to the issuance time.
    pub set_issued_at: bool,
    /// Set `jti` to a freshly generated UUID.
    pub set_unique_id: bool,
    /// Set `exp` to the issuance time plus this many seconds.
    pub ttl_seconds: Option<i64>,
}
