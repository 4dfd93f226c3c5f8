//! ES256 JSON Web Tokens: claim assembly, signing input and signatures.
pub mod claims;
pub mod error;
pub mod signature;
pub mod signed;
pub mod signer;
pub mod unsigned;
