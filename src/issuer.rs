use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::jwt::claims::{ClaimSet, IssuanceDirectives};
use crate::jwt::error::IssueError;
use crate::jwt::signer::JwtSigner;
use crate::jwt::unsigned::{KeyId, UnsignedJwt};

/// Token issuance request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRequest {
    /// All the claims for the token. `null` means no claims.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub claims: ClaimSet,
    /// Whether to set `iat` to the current time. Overrides `iat` in `claims`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_iat: Option<bool>,
    /// Whether to set `jti` to a generated UUID. Overrides `jti` in `claims`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_jti: Option<bool>,
    /// Seconds until the token expires. Overrides `exp` in `claims`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<ClaimSet, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ClaimSet>::deserialize(deserializer)?.unwrap_or_default())
}

impl IssuanceRequest {
    fn into_parts(self) -> (ClaimSet, IssuanceDirectives) {
        let directives = IssuanceDirectives {
            set_issued_at: self.set_iat.unwrap_or_default(),
            set_unique_id: self.set_jti.unwrap_or_default(),
            ttl_seconds: self.ttl,
        };
        (self.claims, directives)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceResponse {
    /// The signed JWT.
    pub token: String,
}

/// Issues tokens with a signer and key ID set up once.
///
/// Holds no mutable state, a single instance can serve concurrent requests
/// as long as the signer can.
pub struct Issuer<S> {
    signer: S,
    key_id: KeyId,
}

impl<S> Issuer<S>
where
    S: JwtSigner,
{
    pub fn new(signer: S, key_id: KeyId) -> Self {
        Self { signer, key_id }
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn issue(&self, request: IssuanceRequest) -> Result<IssuanceResponse, IssueError> {
        self.issue_at(request, Utc::now())
    }

    /// Issues a token as if the current time was `now`.
    pub fn issue_at(
        &self,
        request: IssuanceRequest,
        now: DateTime<Utc>,
    ) -> Result<IssuanceResponse, IssueError> {
        self.try_issue(request, now).inspect_err(|err| {
            warn!(error.kind = err.kind(), "token issuance failed: {err}");
        })
    }

    fn try_issue(
        &self,
        request: IssuanceRequest,
        now: DateTime<Utc>,
    ) -> Result<IssuanceResponse, IssueError> {
        let (claims, directives) = request.into_parts();
        let claims = claims.apply(&directives, now)?;
        debug!(?claims, kid = %self.key_id, "prepared token claims");

        let unsigned = UnsignedJwt::new(claims, &self.key_id)?;

        let start = Instant::now();
        let signed = unsigned.sign(&self.signer)?;
        debug!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "token signed"
        );

        Ok(IssuanceResponse {
            token: signed.into_value(),
        })
    }
}
