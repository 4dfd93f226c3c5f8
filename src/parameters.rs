use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Args, Error, Subcommand, ValueEnum};
use serde_json::Value;
use thiserror::Error;

use crate::http::client::{HttpBuildError, HttpClient};
use crate::http::config::{DEFAULT_REQUEST_TIMEOUT, HttpConfig, ProxyConfig, ProxyError};
use crate::issuer::IssuanceRequest;
use crate::jwt::claims::ClaimSet;
use crate::jwt::signer::JwtSignerImpl;
use crate::jwt::signer::local::{LocalPrivateKeySigner, LocalPrivateKeySignerError};
use crate::jwt::signer::remote::RemoteSigner;
use crate::jwt::unsigned::KeyId;
use crate::remote_signing::key_id_from_reference;
use crate::remote_signing::transit::{DEFAULT_TRANSIT_MOUNT, TransitClient, TransitConfig};

pub const DEFAULT_KEY_NAME: &str = "jwt-issuer";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issues an ES256 signed token with the given claims.
    Issue {
        /// Where the signing key lives.
        #[command(subcommand)]
        signer: SignerArgs,
    },
    /// Generates a P-256 key pair for local signing and prints its public description.
    ///
    /// EXAMPLE:
    /// {
    ///   "keyId": "0b2f6c9e-50f2-4bd4-9b7a-3f1f8b9b8d0e",
    ///   "publicKeyPemBase64": "LS0tLS1CRUdJTi...",
    ///   "signingMethod": "ES256"
    /// }
    GenerateKey(GenerateKeyArgs),
    /// Prints the public description of a remote signing key, for token verifiers.
    KeyInfo {
        /// Where the signing key lives.
        #[command(subcommand)]
        source: KeyInfoArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyInfoArgs {
    /// Read the public key of a Vault Transit key.
    Vault(VaultArgs),
}

#[derive(Subcommand, Debug)]
pub enum SignerArgs {
    /// Sign with a PKCS#8 PEM private key read from disk.
    Local(LocalSignerArgs),
    /// Sign with a key held by a Vault Transit secrets engine.
    Vault(VaultSignerArgs),
}

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Claims of the token, as a JSON object.
    #[arg(long)]
    claims: Option<String>,

    /// Set `iat` to the current time.
    #[arg(long)]
    set_iat: bool,

    /// Set `jti` to a random UUID.
    #[arg(long)]
    set_jti: bool,

    /// Set `exp` this many seconds from now. Negative values issue an expired token.
    #[arg(long, allow_negative_numbers = true)]
    ttl: Option<i64>,

    /// Select how the token is printed.
    #[arg(long, default_value = "Plain")]
    pub output_format: OutputTokenFormat,
}

#[derive(Args, Debug)]
pub struct LocalSignerArgs {
    #[command(flatten)]
    pub issue_args: IssueArgs,

    /// Path to the PKCS#8 PEM private key.
    #[arg(long, env = "JWT_ISSUER_PRIVATE_KEY_PATH")]
    private_key_path: PathBuf,

    /// Key ID reported in the `kid` header. Defaults to the key file name, which is
    /// the key ID `generate-key` reports.
    #[arg(long)]
    key_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct VaultSignerArgs {
    #[command(flatten)]
    pub issue_args: IssueArgs,

    #[command(flatten)]
    pub vault: VaultArgs,
}

#[derive(Args, Debug)]
pub struct VaultArgs {
    /// Address of the Vault server.
    #[arg(long, env = "VAULT_ADDR")]
    vault_address: String,

    /// Token used to authenticate against Vault.
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    vault_token: String,

    /// Name of the transit key.
    #[arg(long)]
    transit_key: String,

    /// Mount path of the transit engine.
    #[arg(long, default_value = DEFAULT_TRANSIT_MOUNT)]
    transit_mount: String,

    /// Key ID reported in the `kid` header. Defaults to the transit key name.
    #[arg(long)]
    key_id: Option<String>,

    /// Seconds to wait for Vault before giving up.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Proxy used to reach Vault. Falls back to `HTTPS_PROXY` and `HTTP_PROXY`.
    #[arg(long)]
    proxy_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct GenerateKeyArgs {
    /// Directory where the key files are written.
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Name of the private key file. The public key is written next to it with a `.pub` suffix.
    #[arg(long, default_value = DEFAULT_KEY_NAME)]
    pub name: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputTokenFormat {
    /// Prints only the token
    #[value(name = "Plain")]
    Plain,
    /// Prints the issuance response as JSON
    #[value(name = "Json")]
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARN")]
    Warn,
    #[value(name = "ERROR")]
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum SignerBuildError {
    /// The private key file is missing or is not a P-256 key.
    #[error("loading private key: {0}")]
    PrivateKey(#[from] LocalPrivateKeySignerError),
    /// The proxy url is invalid.
    #[error("{0}")]
    Proxy(#[from] ProxyError),
    /// The HTTP client for the remote signer could not be built.
    #[error("{0}")]
    HttpClient(#[from] HttpBuildError),
}

impl SignerArgs {
    pub fn issue_args(&self) -> &IssueArgs {
        match self {
            SignerArgs::Local(args) => &args.issue_args,
            SignerArgs::Vault(args) => &args.issue_args,
        }
    }

    /// Builds the configured signer together with the key ID to advertise.
    pub fn build_signer(&self) -> Result<(JwtSignerImpl, KeyId), SignerBuildError> {
        match self {
            SignerArgs::Local(args) => {
                let signer = LocalPrivateKeySigner::try_from(args.private_key_path.as_path())?;
                Ok((JwtSignerImpl::Local(signer), args.key_id()))
            }
            SignerArgs::Vault(args) => {
                let vault = &args.vault;
                let signer = RemoteSigner::new(vault.transit_client()?, vault.transit_key.clone());
                Ok((JwtSignerImpl::Vault(signer), vault.key_id()))
            }
        }
    }
}

impl LocalSignerArgs {
    fn key_id(&self) -> KeyId {
        let key_id = self.key_id.clone().or_else(|| {
            self.private_key_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        });
        KeyId::from(key_id.unwrap_or_default())
    }
}

impl VaultArgs {
    pub fn transit_key(&self) -> &str {
        &self.transit_key
    }

    pub fn key_id(&self) -> KeyId {
        let key_id = self
            .key_id
            .clone()
            .unwrap_or_else(|| key_id_from_reference(&self.transit_key).to_string());
        KeyId::from(key_id)
    }

    pub fn transit_client(&self) -> Result<TransitClient<HttpClient>, SignerBuildError> {
        let proxy = ProxyConfig::new(self.proxy_url.as_deref().unwrap_or_default())?
            .try_with_url_from_env()?;
        let timeout = Duration::from_secs(self.timeout_secs);
        let http_client = HttpClient::new(HttpConfig::new(timeout, timeout, proxy))?;

        Ok(TransitClient::new(
            http_client,
            TransitConfig {
                address: self.vault_address.clone(),
                token: self.vault_token.clone(),
                mount: self.transit_mount.clone(),
            },
        ))
    }
}

impl IssueArgs {
    pub fn build_request(&self) -> Result<IssuanceRequest, Error> {
        let claims = match &self.claims {
            Some(claims) => {
                let value: Value = serde_json::from_str(claims).map_err(|e| {
                    Error::raw(ErrorKind::ValueValidation, format!("invalid claims: {e}\n"))
                })?;
                ClaimSet::try_from(value)
                    .map_err(|e| Error::raw(ErrorKind::ValueValidation, format!("{e}\n")))?
            }
            None => ClaimSet::default(),
        };

        Ok(IssuanceRequest {
            claims,
            set_iat: Some(self.set_iat),
            set_jti: Some(self.set_jti),
            ttl: self.ttl,
        })
    }
}
