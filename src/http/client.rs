use crate::http::config::HttpConfig;
use crate::http_client::{HttpClient as SigningHttpClient, HttpClientError as SigningHttpClientError};
use http::Response as HttpResponse;
use http::{Request, Response};
use reqwest::Proxy;
use reqwest::blocking::{Client, Response as BlockingResponse};

/// Blocking `reqwest` client. Cloning it is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, HttpBuildError> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .tls_built_in_native_certs(true)
            .timeout(config.timeout)
            .connect_timeout(config.conn_timeout);

        if !config.proxy.is_empty() {
            let proxy = Proxy::all(config.proxy.url_as_string())
                .map_err(|err| HttpBuildError::ClientBuilder(err.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|err| HttpBuildError::ClientBuilder(err.to_string()))?;

        Ok(Self { client })
    }

    fn send(&self, request: Request<Vec<u8>>) -> Result<HttpResponse<Vec<u8>>, HttpResponseError> {
        let req = self
            .client
            .request(request.method().clone(), request.uri().to_string().as_str())
            .headers(request.headers().clone())
            .body(request.body().to_vec());

        let res = req.send().map_err(HttpResponseError::from)?;

        try_build_response(res)
    }
}

fn try_build_response(res: BlockingResponse) -> Result<HttpResponse<Vec<u8>>, HttpResponseError> {
    let status = res.status();
    let version = res.version();

    let body: Vec<u8> = res.bytes().map_err(HttpResponseError::from)?.into();

    http::Response::builder()
        .status(status)
        .version(version)
        .body(body)
        .map_err(|err| HttpResponseError::BuildingResponse(err.to_string()))
}

impl SigningHttpClient for HttpClient {
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, SigningHttpClientError> {
        let response = self.send(req)?;

        Ok(response)
    }
}

impl From<HttpResponseError> for SigningHttpClientError {
    fn from(err: HttpResponseError) -> Self {
        match err {
            HttpResponseError::TransportError(msg) => SigningHttpClientError::TransportError(msg),
            HttpResponseError::Timeout(msg) => SigningHttpClientError::Timeout(msg),
            HttpResponseError::BuildingResponse(msg) | HttpResponseError::ReadingResponse(msg) => {
                SigningHttpClientError::InvalidResponse(msg)
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HttpBuildError {
    /// The TLS or proxy configuration was rejected.
    #[error("could not build the http client: {0}")]
    ClientBuilder(String),
}

#[derive(thiserror::Error, Debug)]
enum HttpResponseError {
    /// The body could not be read.
    #[error("could read response body: {0}")]
    ReadingResponse(String),
    /// The response could not be rebuilt as an `http::Response`.
    #[error("could build response: {0}")]
    BuildingResponse(String),
    /// The request failed before a response arrived.
    #[error("http transport error: `{0}`")]
    TransportError(String),
    /// The request did not complete before the configured timeout.
    #[error("http request timed out: `{0}`")]
    Timeout(String),
}

impl From<reqwest::Error> for HttpResponseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpResponseError::Timeout(err.to_string())
        } else if err.is_body() || err.is_decode() {
            HttpResponseError::ReadingResponse(err.to_string())
        } else {
            HttpResponseError::TransportError(err.to_string())
        }
    }
}
