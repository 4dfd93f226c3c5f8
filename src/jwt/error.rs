use thiserror::Error;

use super::signature::MalformedSignatureError;
use crate::remote_signing::RemoteSigningError;

/// Errors returned by a `JwtSigner`.
#[derive(Error, Debug)]
pub enum SigningError {
    /// The configured key cannot be used for ES256.
    #[error("invalid signing key: `{0}`")]
    InvalidKey(String),
    /// Signing with a local key failed after it was loaded.
    #[error("local signing failed: `{0}`")]
    Local(String),
    /// The remote signing service failed or could not be reached.
    #[error("remote signing failed: `{0}`")]
    Remote(#[from] RemoteSigningError),
    /// The signature returned could not be converted to the JOSE layout.
    #[error("malformed signature: `{0}`")]
    MalformedSignature(#[from] MalformedSignatureError),
}

/// Reasons a token could not be issued. No token is produced in any of these cases.
#[derive(Error, Debug)]
pub enum IssueError {
    /// Claims or directives that cannot be turned into a token.
    #[error("invalid issuance input: `{0}`")]
    Input(String),
    /// The signer failed, see `SigningError`.
    #[error("signing token: `{0}`")]
    Signing(SigningError),
    /// The remote signer answered with something other than a P-256 DER signature.
    #[error("remote signer returned a malformed signature: `{0}`")]
    MalformedSignature(MalformedSignatureError),
}

impl IssueError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Signing(_) => "signing",
            Self::MalformedSignature(_) => "malformed_signature",
        }
    }
}

impl From<SigningError> for IssueError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::MalformedSignature(e) => Self::MalformedSignature(e),
            other => Self::Signing(other),
        }
    }
}

impl From<serde_json::Error> for IssueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Input(err.to_string())
    }
}
