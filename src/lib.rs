//! Issues ES256 signed JSON Web Tokens, signing either with a local P-256
//! private key or through a remote signing service that holds the key.
pub mod commands;
pub mod http;
pub mod http_client;
pub mod issuer;
pub mod jwt;
pub mod key;
pub mod parameters;
pub mod remote_signing;

pub use issuer::{IssuanceRequest, IssuanceResponse, Issuer};
pub use jwt::error::IssueError;
