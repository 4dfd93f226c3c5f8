use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rcgen::{KeyPair as RcKeyPair, PKCS_ECDSA_P256_SHA256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::key::creator::{CreationError, Creator, KeyPair, KeyType, Options, PublicKeyPem};

/// Suffix of the file holding the public key, next to the private key.
pub const PUBLIC_KEY_SUFFIX: &str = ".pub";

const PRIVATE_KEY_MODE: u32 = 0o600;
const PUBLIC_KEY_MODE: u32 = 0o644;

#[derive(Error, Debug)]
pub enum LocalKeyCreationError {
    /// The key directory does not exist or is not a directory.
    #[error("invalid path: `{0}`")]
    InvalidPath(String),
    /// The key pair could not be generated.
    #[error("unable to generate key: `{0}`")]
    UnableToGenerateKey(String),
    /// One of the key files is already there. Nothing is written in that case.
    #[error("key file already exists: `{0}`")]
    AlreadyExists(String),
    /// A key file could not be created.
    #[error("unable to create key file: `{0}`")]
    UnableToCreateKeyFile(String),
    /// A key file could not be written.
    #[error("unable to write key: `{0}`")]
    UnableToWriteKey(String),
}

/// Creates keys and stores them as PEM files in a directory.
#[derive(Debug)]
pub struct LocalCreator {
    path: PathBuf,
}

impl Creator for LocalCreator {
    /// Writes `<dir>/<name>` with the private key, readable by its owner only, and
    /// `<dir>/<name>.pub` with the public one. Either both files are stored or none.
    fn create(&self, options: Options) -> Result<PublicKeyPem, CreationError> {
        let key_pair = generate(options.key_type)?;

        let private_key_path = self.path.join(&options.name);
        let public_key_path = self
            .path
            .join(format!("{}{PUBLIC_KEY_SUFFIX}", options.name));

        let private_file = create_new(&private_key_path, PRIVATE_KEY_MODE)?;
        let public_file = create_new(&public_key_path, PUBLIC_KEY_MODE).inspect_err(|_| {
            discard(&private_key_path);
        })?;

        write_key(private_file, &key_pair.private_key)
            .and_then(|_| write_key(public_file, &key_pair.public_key))
            .inspect_err(|_| {
                discard(&private_key_path);
                discard(&public_key_path);
            })?;
        debug!(path = %private_key_path.display(), "stored new private key");

        Ok(key_pair.public_key)
    }
}

impl TryFrom<PathBuf> for LocalCreator {
    type Error = LocalKeyCreationError;

    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        if !value.exists() {
            return Err(LocalKeyCreationError::InvalidPath(String::from(
                "local key path does not exist",
            )));
        }
        if !value.is_dir() {
            return Err(LocalKeyCreationError::InvalidPath(String::from(
                "local key path needs to be a directory",
            )));
        }
        Ok(LocalCreator { path: value })
    }
}

/// Creates a file that must not exist yet. `mode` only applies on unix.
#[cfg_attr(not(unix), allow(unused_variables))]
fn create_new(path: &Path, mode: u32) -> Result<File, LocalKeyCreationError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, mode);

    options.open(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => LocalKeyCreationError::AlreadyExists(path.display().to_string()),
        _ => LocalKeyCreationError::UnableToCreateKeyFile(e.to_string()),
    })
}

fn write_key(mut file: File, content: &[u8]) -> Result<(), LocalKeyCreationError> {
    file.write_all(content)
        .and_then(|_| file.sync_all())
        .map_err(|e| LocalKeyCreationError::UnableToWriteKey(e.to_string()))
}

/// Removes a key file this creator made before failing.
fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!(path = %path.display(), "could not remove incomplete key file: {err}");
    }
}

impl From<LocalKeyCreationError> for CreationError {
    fn from(value: LocalKeyCreationError) -> Self {
        CreationError::UnableToCreateKey(value.to_string())
    }
}

fn generate(key_type: KeyType) -> Result<KeyPair, LocalKeyCreationError> {
    let algorithm = match key_type {
        KeyType::EcP256 => &PKCS_ECDSA_P256_SHA256,
    };

    let key_pair = RcKeyPair::generate_for(algorithm)
        .map_err(|e| LocalKeyCreationError::UnableToGenerateKey(e.to_string()))?;

    Ok(KeyPair {
        private_key: key_pair.serialize_pem().into_bytes(),
        public_key: key_pair.public_key_pem().into_bytes(),
    })
}
