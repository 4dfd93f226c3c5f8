//! Contract of the remote asymmetric signing service. The private key never leaves
//! the service; callers send the message and get back a DER encoded signature.
use thiserror::Error;

pub mod transit;

/// Reference of the key held by the remote signing service.
pub type KeyReference = String;

#[derive(Error, Debug)]
pub enum RemoteSigningError {
    /// The service refused the credentials or the key.
    #[error("access denied: `{0}`")]
    AccessDenied(String),
    /// No answer before the deadline.
    #[error("signing request timed out: `{0}`")]
    Timeout(String),
    /// The service could not be reached.
    #[error("http transport error: `{0}`")]
    Transport(String),
    /// Any other failure reported by the service, with its status code.
    #[error("signing service error: Status code: `{0}`, Reason: `{1}`")]
    Service(u16, String),
    /// The service answered with something that is not a signature.
    #[error("invalid signing service response: `{0}`")]
    InvalidResponse(String),
}

/// How the service must interpret the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// The message is not hashed yet, the service hashes it.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    /// ECDSA over P-256 with SHA-256, DER encoded result.
    EcdsaSha256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub key_reference: KeyReference,
    pub message: Vec<u8>,
    pub message_type: MessageType,
    pub algorithm: SigningAlgorithm,
}

impl SignRequest {
    /// Request to sign `message` as is with ECDSA-SHA256.
    pub fn ecdsa_sha256(key_reference: KeyReference, message: Vec<u8>) -> Self {
        Self {
            key_reference,
            message,
            message_type: MessageType::Raw,
            algorithm: SigningAlgorithm::EcdsaSha256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignResponse {
    /// DER encoded `Ecdsa-Sig-Value`.
    pub signature: Vec<u8>,
}

/// Client of a remote signing service.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteSigningClient {
    fn sign(&self, request: SignRequest) -> Result<SignResponse, RemoteSigningError>;
}

/// Where the public half of a remote key can be read, so verifiers can be told about it.
#[cfg_attr(test, mockall::automock)]
pub trait PublicKeySource {
    /// Returns the SPKI PEM of the current version of the key.
    fn public_key(&self, key_reference: &str) -> Result<Vec<u8>, RemoteSigningError>;
}

/// Key ID to report for a key reference: its last `/` separated segment, so a
/// reference such as `arn:aws:kms:us-east-1:111111111111:key/4a2c1b37` is
/// reported as `4a2c1b37`.
pub fn key_id_from_reference(key_reference: &str) -> &str {
    key_reference
        .rsplit_once('/')
        .map_or(key_reference, |(_, key_id)| key_id)
}
