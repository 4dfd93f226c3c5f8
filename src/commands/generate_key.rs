use crate::key::KeyInfo;
use crate::key::creator::{CreationError, Creator, KeyType, Options};

pub struct GenerateKeyCommand<C> {
    creator: C,
}

impl<C> GenerateKeyCommand<C>
where
    C: Creator,
{
    pub fn new(creator: C) -> Self {
        Self { creator }
    }

    /// Creates an ES256 key named `name` and describes its public half.
    ///
    /// The key name is also its key ID, which is what `issue local` puts in the
    /// `kid` header when signing with the stored key.
    pub fn generate(&self, name: String) -> Result<KeyInfo, CreationError> {
        let public_key = self.creator.create(Options {
            key_type: KeyType::EcP256,
            name: name.clone(),
        })?;
        Ok(KeyInfo::es256(name, &public_key))
    }
}
