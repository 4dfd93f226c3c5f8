use jsonwebtoken::DecodingKey;

use crate::jwt::unsigned::KeyId;
use crate::key::KeyInfo;
use crate::remote_signing::{PublicKeySource, RemoteSigningError};

/// Describes a remote key so the verifiers of the tokens it signs can trust it.
pub struct KeyInfoCommand<P> {
    source: P,
}

impl<P> KeyInfoCommand<P>
where
    P: PublicKeySource,
{
    pub fn new(source: P) -> Self {
        Self { source }
    }

    pub fn key_info(
        &self,
        key_reference: &str,
        key_id: &KeyId,
    ) -> Result<KeyInfo, RemoteSigningError> {
        let public_key = self.source.public_key(key_reference)?;
        DecodingKey::from_ec_pem(&public_key).map_err(|e| {
            RemoteSigningError::InvalidResponse(format!("public key is not a P-256 key: {e}"))
        })?;

        Ok(KeyInfo::es256(key_id.as_str(), &public_key).with_key_reference(key_reference))
    }
}
