use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, Header};

use super::claims::ClaimSet;
use super::error::IssueError;
use super::signed::SignedJwt;
use super::signer::JwtSigner;

/// Identifier of the signing key, reported to verifiers in the `kid` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyId(String);

impl KeyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for KeyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for KeyId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A JWT whose header and payload are fixed and only lack the signature.
///
/// Both parts are serialized when the value is built, so the signing input
/// handed to the signer is the exact byte string a verifier reconstructs.
#[derive(Debug, Clone)]
pub struct UnsignedJwt {
    header: Header,
    claims: ClaimSet,
    signing_input: String,
}

impl UnsignedJwt {
    /// Builds an ES256 token for `claims`. The `kid` header is only set for a
    /// non-empty `key_id`.
    pub fn new(claims: ClaimSet, key_id: &KeyId) -> Result<Self, IssueError> {
        let mut header = Header::new(Algorithm::ES256);
        if !key_id.is_empty() {
            header.kid = Some(key_id.to_string());
        }

        let encoded_header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let encoded_claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);

        Ok(Self {
            header,
            claims,
            signing_input: format!("{encoded_header}.{encoded_claims}"),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// `base64url(header).base64url(payload)`, the bytes covered by the signature.
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// Signs the token, appending the base64url encoded JOSE signature.
    pub fn sign<S>(self, signer: &S) -> Result<SignedJwt, IssueError>
    where
        S: JwtSigner + ?Sized,
    {
        let signature = signer.sign(self.signing_input.as_bytes())?;
        Ok(SignedJwt {
            value: format!(
                "{}.{}",
                self.signing_input,
                URL_SAFE_NO_PAD.encode(signature)
            ),
        })
    }
}
