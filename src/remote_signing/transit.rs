//! Remote signing with a [Vault Transit] secrets engine.
//!
//! [Vault Transit]: https://developer.hashicorp.com/vault/api-docs/secret/transit#sign-data
use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    MessageType, PublicKeySource, RemoteSigningClient, RemoteSigningError, SignRequest,
    SignResponse, SigningAlgorithm,
};
use crate::http_client::{HttpClient, HttpClientError};

/// Mount path of the transit engine when none is configured.
pub const DEFAULT_TRANSIT_MOUNT: &str = "transit";

const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";
const P256_KEY_TYPE: &str = "ecdsa-p256";

/// Where and how to reach the transit engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitConfig {
    /// Vault address, such as `https://vault.example.com:8200`.
    pub address: String,
    pub token: String,
    pub mount: String,
}

/// Client of the transit `sign` and `keys` endpoints. Key references are transit key names.
pub struct TransitClient<C> {
    http_client: C,
    config: TransitConfig,
}

impl<C> TransitClient<C> {
    pub fn new(http_client: C, config: TransitConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/{path}",
            self.config.address.trim_end_matches('/'),
            self.config.mount.trim_matches('/'),
        )
    }

    fn sign_url(&self, key_name: &str, algorithm: SigningAlgorithm) -> String {
        let hash_algorithm = match algorithm {
            SigningAlgorithm::EcdsaSha256 => "sha2-256",
        };
        self.url(&format!("sign/{key_name}/{hash_algorithm}"))
    }
}

impl<C> TransitClient<C>
where
    C: HttpClient,
{
    /// Sends an authenticated request and returns the body of a successful response.
    fn send(
        &self,
        method: Method,
        url: String,
        body: Vec<u8>,
    ) -> Result<String, RemoteSigningError> {
        let http_request = Request::builder()
            .method(method)
            .uri(url)
            .header(VAULT_TOKEN_HEADER, &self.config.token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .map_err(|e| RemoteSigningError::Transport(format!("building request: {e}")))?;

        let response = self.http_client.send(http_request)?;
        let status = response.status();
        let body = String::from_utf8_lossy(response.body()).into_owned();
        debug!(%status, "transit response");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RemoteSigningError::AccessDenied(body))
            }
            status if !status.is_success() => {
                Err(RemoteSigningError::Service(status.as_u16(), body))
            }
            _ => Ok(body),
        }
    }
}

#[derive(Debug, Serialize)]
struct TransitSignBody {
    /// Base64 encoded message.
    input: String,
    prehashed: bool,
    marshaling_algorithm: &'static str,
}

#[derive(Debug, Deserialize)]
struct TransitSignResponse {
    data: TransitSignData,
}

#[derive(Debug, Deserialize)]
struct TransitSignData {
    /// `vault:v<key version>:<base64 signature>`
    signature: String,
}

#[derive(Debug, Deserialize)]
struct TransitKeyResponse {
    data: TransitKeyData,
}

#[derive(Debug, Deserialize)]
struct TransitKeyData {
    #[serde(rename = "type")]
    key_type: String,
    latest_version: u64,
    /// Versions of the key, by version number. Symmetric keys only list creation times.
    keys: HashMap<String, serde_json::Value>,
}

impl<C> RemoteSigningClient for TransitClient<C>
where
    C: HttpClient,
{
    fn sign(&self, request: SignRequest) -> Result<SignResponse, RemoteSigningError> {
        let body = TransitSignBody {
            input: STANDARD.encode(&request.message),
            prehashed: match request.message_type {
                MessageType::Raw => false,
            },
            marshaling_algorithm: "asn1",
        };
        let body = serde_json::to_vec(&body)
            .map_err(|e| RemoteSigningError::Transport(format!("encoding request: {e}")))?;

        let body = self.send(
            Method::POST,
            self.sign_url(&request.key_reference, request.algorithm),
            body,
        )?;

        let response: TransitSignResponse = serde_json::from_str(&body)
            .map_err(|e| RemoteSigningError::InvalidResponse(e.to_string()))?;

        Ok(SignResponse {
            signature: decode_signature(&response.data.signature)?,
        })
    }
}

impl<C> PublicKeySource for TransitClient<C>
where
    C: HttpClient,
{
    fn public_key(&self, key_reference: &str) -> Result<Vec<u8>, RemoteSigningError> {
        let body = self.send(
            Method::GET,
            self.url(&format!("keys/{key_reference}")),
            Vec::new(),
        )?;

        let response: TransitKeyResponse = serde_json::from_str(&body)
            .map_err(|e| RemoteSigningError::InvalidResponse(e.to_string()))?;
        let data = response.data;

        if data.key_type != P256_KEY_TYPE {
            return Err(RemoteSigningError::InvalidResponse(format!(
                "key `{key_reference}` is of type `{}`, expected `{P256_KEY_TYPE}`",
                data.key_type
            )));
        }

        data.keys
            .get(&data.latest_version.to_string())
            .and_then(|version| version.get("public_key"))
            .and_then(serde_json::Value::as_str)
            .filter(|public_key| !public_key.is_empty())
            .map(|public_key| public_key.as_bytes().to_vec())
            .ok_or_else(|| {
                RemoteSigningError::InvalidResponse(format!(
                    "no public key for version {} of `{key_reference}`",
                    data.latest_version
                ))
            })
    }
}

/// Extracts the DER bytes of a `vault:v<N>:<base64>` signature.
fn decode_signature(signature: &str) -> Result<Vec<u8>, RemoteSigningError> {
    let encoded = match signature.splitn(3, ':').collect::<Vec<_>>()[..] {
        ["vault", version, encoded] if version.starts_with('v') => encoded,
        _ => {
            return Err(RemoteSigningError::InvalidResponse(format!(
                "unexpected signature format `{signature}`"
            )));
        }
    };
    STANDARD
        .decode(encoded)
        .map_err(|e| RemoteSigningError::InvalidResponse(format!("decoding signature: {e}")))
}

impl From<HttpClientError> for RemoteSigningError {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::Timeout(msg) => RemoteSigningError::Timeout(msg),
            HttpClientError::TransportError(msg) => RemoteSigningError::Transport(msg),
            HttpClientError::InvalidResponse(msg) => RemoteSigningError::InvalidResponse(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::HttpClient as ReqwestHttpClient;
    use crate::http::config::{HttpConfig, ProxyConfig};
    use crate::http_client::tests::MockHttpClient;
    use assert_matches::assert_matches;
    use http::Response;
    use crate::jwt::signer::local::tests::ES256_PUBLIC_KEY;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use serde_json::json;
    use std::time::Duration;

    // r = 1, s = 2
    const DER_SIGNATURE: [u8; 8] = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02];

    fn config(address: String) -> TransitConfig {
        TransitConfig {
            address,
            token: "s.token".into(),
            mount: DEFAULT_TRANSIT_MOUNT.into(),
        }
    }

    fn reqwest_client(timeout: Duration) -> ReqwestHttpClient {
        ReqwestHttpClient::new(HttpConfig::new(timeout, timeout, ProxyConfig::default())).unwrap()
    }

    fn sign_request() -> SignRequest {
        SignRequest::ecdsa_sha256("jwt-issuer".into(), b"header.payload".to_vec())
    }

    #[test]
    fn signs_raw_message_with_vault() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/transit/sign/jwt-issuer/sha2-256")
                .header("X-Vault-Token", "s.token")
                .json_body(json!({
                    "input": STANDARD.encode(b"header.payload"),
                    "prehashed": false,
                    "marshaling_algorithm": "asn1"
                }));
            then.status(200).json_body(json!({
                "data": {
                    "signature": format!("vault:v1:{}", STANDARD.encode(DER_SIGNATURE)),
                    "key_version": 1
                }
            }));
        });

        let client = TransitClient::new(reqwest_client(Duration::from_secs(1)), config(server.base_url()));

        let response = client.sign(sign_request()).unwrap();

        assert_eq!(response.signature, DER_SIGNATURE);
        mock.assert();
    }

    #[test]
    fn slow_vault_is_a_timeout() {
        let timeout = Duration::from_millis(50);
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/transit/sign/jwt-issuer/sha2-256");
            then.status(200)
                .delay(timeout.saturating_add(Duration::from_millis(200)));
        });

        let client = TransitClient::new(reqwest_client(timeout), config(server.base_url()));

        let error = client.sign(sign_request()).unwrap_err();

        assert_matches!(error, RemoteSigningError::Timeout(_));
        mock.assert();
    }

    #[test]
    fn forbidden_is_access_denied() {
        let mut http_client = MockHttpClient::new();
        http_client.expect_send().once().returning(|_| {
            Ok(Response::builder()
                .status(403)
                .body(br#"{"errors":["permission denied"]}"#.to_vec())
                .unwrap())
        });

        let client = TransitClient::new(http_client, config("http://vault:8200".into()));

        assert_matches!(
            client.sign(sign_request()),
            Err(RemoteSigningError::AccessDenied(body)) => {
                assert!(body.contains("permission denied"));
            }
        );
    }

    #[test]
    fn server_error_is_a_service_error() {
        let mut http_client = MockHttpClient::new();
        http_client.expect_send().once().returning(|_| {
            Ok(Response::builder()
                .status(500)
                .body(b"internal".to_vec())
                .unwrap())
        });

        let client = TransitClient::new(http_client, config("http://vault:8200".into()));

        assert_matches!(
            client.sign(sign_request()),
            Err(RemoteSigningError::Service(500, body)) => {
                assert_eq!(body, "internal");
            }
        );
    }

    #[test]
    fn request_targets_configured_mount() {
        let mut http_client = MockHttpClient::new();
        http_client
            .expect_send()
            .once()
            .withf(|request| {
                request.uri() == "http://vault:8200/v1/pki-signing/sign/jwt-issuer/sha2-256"
                    && request.method() == Method::POST
            })
            .returning(|_| {
                let body = json!({"data": {"signature": format!("vault:v3:{}", STANDARD.encode(DER_SIGNATURE))}});
                Ok(Response::builder()
                    .status(200)
                    .body(serde_json::to_vec(&body).unwrap())
                    .unwrap())
            });

        let client = TransitClient::new(
            http_client,
            TransitConfig {
                address: "http://vault:8200/".into(),
                token: "s.token".into(),
                mount: "/pki-signing/".into(),
            },
        );

        assert_eq!(client.sign(sign_request()).unwrap().signature, DER_SIGNATURE);
    }

    #[test]
    fn transport_errors_are_mapped() {
        let mut http_client = MockHttpClient::new();
        http_client
            .expect_send()
            .once()
            .returning(|_| Err(HttpClientError::TransportError("connection refused".into())));

        let client = TransitClient::new(http_client, config("http://vault:8200".into()));

        assert_matches!(client.sign(sign_request()), Err(RemoteSigningError::Transport(_)));
    }

    #[test]
    fn unexpected_body_is_an_invalid_response() {
        let mut http_client = MockHttpClient::new();
        http_client.expect_send().once().returning(|_| {
            Ok(Response::builder()
                .status(200)
                .body(br#"{"data":{}}"#.to_vec())
                .unwrap())
        });

        let client = TransitClient::new(http_client, config("http://vault:8200".into()));

        assert_matches!(
            client.sign(sign_request()),
            Err(RemoteSigningError::InvalidResponse(_))
        );
    }

    #[test]
    fn reads_latest_public_key() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/transit/keys/jwt-issuer")
                .header("X-Vault-Token", "s.token");
            then.status(200).json_body(json!({
                "data": {
                    "name": "jwt-issuer",
                    "type": "ecdsa-p256",
                    "latest_version": 2,
                    "keys": {
                        "1": {"public_key": "old", "creation_time": "2024-01-01T00:00:00Z"},
                        "2": {"public_key": ES256_PUBLIC_KEY, "creation_time": "2024-06-01T00:00:00Z"}
                    }
                }
            }));
        });

        let client = TransitClient::new(reqwest_client(Duration::from_secs(1)), config(server.base_url()));

        let public_key = client.public_key("jwt-issuer").unwrap();

        assert_eq!(public_key, ES256_PUBLIC_KEY.as_bytes());
        mock.assert();
    }

    #[test]
    fn public_key_of_other_key_types_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/transit/keys/jwt-issuer");
            then.status(200).json_body(json!({
                "data": {
                    "type": "aes256-gcm96",
                    "latest_version": 1,
                    "keys": {"1": 1718000000}
                }
            }));
        });

        let client = TransitClient::new(reqwest_client(Duration::from_secs(1)), config(server.base_url()));

        assert_matches!(
            client.public_key("jwt-issuer"),
            Err(RemoteSigningError::InvalidResponse(_))
        );
    }

    #[test]
    fn missing_key_is_a_service_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/transit/keys/unknown");
            then.status(404).body(r#"{"errors":[]}"#);
        });

        let client = TransitClient::new(reqwest_client(Duration::from_secs(1)), config(server.base_url()));

        assert_matches!(
            client.public_key("unknown"),
            Err(RemoteSigningError::Service(404, _))
        );
    }

    #[test]
    fn signature_prefix_is_required() {
        let encoded = STANDARD.encode(DER_SIGNATURE);
        assert_eq!(
            decode_signature(&format!("vault:v12:{encoded}")).unwrap(),
            DER_SIGNATURE
        );
        assert!(decode_signature(&encoded).is_err());
        assert!(decode_signature(&format!("vault:1:{encoded}")).is_err());
        assert!(decode_signature("vault:v1:not base64!").is_err());
    }
}
