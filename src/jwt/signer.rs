use super::error::SigningError;
use crate::http::client::HttpClient;
use crate::remote_signing::transit::TransitClient;
use local::LocalPrivateKeySigner;
use remote::RemoteSigner;

pub mod local;
pub mod remote;

/// A JWT signer.
///
/// Signs the JWS signing input with ECDSA P-256 / SHA-256 and returns the
/// fixed-width `r || s` signature.
#[cfg_attr(test, mockall::automock)]
pub trait JwtSigner {
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// Enumerates all implementations for `JwtSigner` for static dispatching reasons.
pub enum JwtSignerImpl {
    Local(LocalPrivateKeySigner),
    Vault(RemoteSigner<TransitClient<HttpClient>>),
}

impl JwtSigner for JwtSignerImpl {
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, SigningError> {
        match self {
            Self::Local(local_signer) => local_signer.sign(signing_input),
            Self::Vault(remote_signer) => remote_signer.sign(signing_input),
        }
    }
}
