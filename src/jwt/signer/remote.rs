use tracing::debug;

use crate::jwt::error::SigningError;
use crate::jwt::signature::{P256_FIELD_WIDTH, der_to_jose};
use crate::remote_signing::{KeyReference, RemoteSigningClient, SignRequest};

use super::JwtSigner;

/// Signer delegating to a remote signing service that holds the private key.
///
/// It never sees key material: the signing input is sent as is (the service
/// hashes it) and the DER signature returned is converted to the JOSE layout.
/// Failures are returned as they come, retrying is up to the caller.
pub struct RemoteSigner<C> {
    client: C,
    key_reference: KeyReference,
}

impl<C> RemoteSigner<C> {
    pub fn new(client: C, key_reference: impl Into<KeyReference>) -> Self {
        Self {
            client,
            key_reference: key_reference.into(),
        }
    }

    pub fn key_reference(&self) -> &str {
        &self.key_reference
    }
}

impl<C> JwtSigner for RemoteSigner<C>
where
    C: RemoteSigningClient,
{
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, SigningError> {
        let request = SignRequest::ecdsa_sha256(self.key_reference.clone(), signing_input.to_vec());
        let response = self.client.sign(request)?;
        debug!(
            key_reference = %self.key_reference,
            der_len = response.signature.len(),
            "remote signature received"
        );

        Ok(der_to_jose(&response.signature, P256_FIELD_WIDTH)?)
    }
}
