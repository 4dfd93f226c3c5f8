use thiserror::Error;

/// Type of key to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// ECDSA key on the NIST P-256 curve, used for ES256.
    EcP256,
}

pub struct Options {
    pub key_type: KeyType,
    /// Name of the key, the private key file is stored under it.
    pub name: String,
}

/// A PEM-encoded public key.
pub type PublicKeyPem = Vec<u8>;

pub struct KeyPair {
    /// PKCS#8 PEM.
    pub private_key: Vec<u8>,
    /// SPKI PEM.
    pub public_key: PublicKeyPem,
}

#[derive(Error, Debug)]
pub enum CreationError {
    /// The key could not be generated or stored.
    #[error("unable to create key: `{0}`")]
    UnableToCreateKey(String),
}

/// Creates signing keys, keeping the private half wherever the implementation stores it.
pub trait Creator {
    /// Returns the public key of the created key in PEM format.
    fn create(&self, options: Options) -> Result<PublicKeyPem, CreationError>;
}
