use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

pub mod creator;
pub mod local;

/// Public description of a signing key, as handed to token verifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    /// Key reference in the remote signing service, for remote keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_reference: Option<String>,
    /// Value of the `kid` header of the tokens signed with the key.
    pub key_id: String,
    /// The SPKI PEM of the public key, standard base64 encoded.
    pub public_key_pem_base64: String,
    pub signing_method: String,
}

impl KeyInfo {
    /// Describes an ES256 public key advertised under `key_id`.
    pub fn es256(key_id: impl Into<String>, public_key_pem: &[u8]) -> Self {
        Self {
            key_reference: None,
            key_id: key_id.into(),
            public_key_pem_base64: STANDARD.encode(public_key_pem),
            signing_method: "ES256".to_string(),
        }
    }

    pub fn with_key_reference(self, key_reference: impl Into<String>) -> Self {
        Self {
            key_reference: Some(key_reference.into()),
            ..self
        }
    }
}
