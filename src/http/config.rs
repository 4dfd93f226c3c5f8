use clap::{error::Error as ClapError, error::ErrorKind};
use http::Uri;
use std::env;
use std::env::VarError;
use std::fmt::Display;
use std::time::Duration;

/// Default deadline for a whole remote signing request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const HTTP_PROXY_ENV_NAME: &str = "HTTP_PROXY";
const HTTPS_PROXY_ENV_NAME: &str = "HTTPS_PROXY";

/// Settings of the HTTP client used to reach the remote signer.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// Deadline of a request, from connecting until the body is read.
    pub(crate) timeout: Duration,
    pub(crate) conn_timeout: Duration,
    pub(crate) proxy: ProxyConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            conn_timeout: DEFAULT_REQUEST_TIMEOUT,
            proxy: ProxyConfig::default(),
        }
    }
}

impl HttpConfig {
    pub fn new(timeout: Duration, conn_timeout: Duration, proxy: ProxyConfig) -> Self {
        Self {
            timeout,
            conn_timeout,
            proxy,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    /// The url cannot be parsed as an URI.
    #[error("invalid proxy url `{0}`: `{1}`")]
    InvalidUrl(String, String),
}

/// Type to represent a Url which can be used in proxy implementations.
/// It allows representing empty urls and perform basic uri validations.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct ProxyUrl(Option<Uri>);

impl TryFrom<&str> for ProxyUrl {
    type Error = ProxyError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.is_empty() {
            return Ok(Self(None));
        }
        let uri = s
            .parse::<Uri>()
            .map_err(|err| ProxyError::InvalidUrl(s.to_string(), err.to_string()))?;
        Ok(Self(Some(uri)))
    }
}

impl Display for ProxyUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(url) => write!(f, "{url}"),
            None => write!(f, ""),
        }
    }
}

impl ProxyUrl {
    fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Proxy for the signing service HTTP client.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ProxyConfig {
    /// Proxy URL proxy:
    /// <protocol>://<user>:<password>@<host>:<port>
    /// (All parts except host are optional)
    url: ProxyUrl,
}

impl ProxyConfig {
    pub fn new(proxy_url: &str) -> Result<Self, ProxyError> {
        Ok(Self {
            url: ProxyUrl::try_from(proxy_url)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }

    /// Returns a string representation of the proxy url.
    pub fn url_as_string(&self) -> String {
        self.url.to_string()
    }

    /// Returns a new instance whose url is taken from the standard environment variables if needed.
    pub fn try_with_url_from_env(self) -> Result<Self, ProxyError> {
        self.with_env_aware_url(env::var)
    }

    /// Falls back to `HTTPS_PROXY`, then `HTTP_PROXY`, when no url is configured.
    fn with_env_aware_url<F>(self, env_var: F) -> Result<Self, ProxyError>
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        if !self.url.is_empty() {
            return Ok(self);
        }
        let url = env_var(HTTPS_PROXY_ENV_NAME)
            .or_else(|_| env_var(HTTP_PROXY_ENV_NAME))
            .unwrap_or_default()
            .as_str()
            .try_into()?;
        Ok(ProxyConfig { url })
    }
}

impl From<ProxyError> for ClapError {
    fn from(err: ProxyError) -> ClapError {
        ClapError::raw(ErrorKind::InvalidValue, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{ProxyConfig, ProxyError, ProxyUrl};
    use assert_matches::assert_matches;
    use rstest::rstest;
    use std::env::VarError;

    #[rstest]
    #[case::nothing_configured(&[("SOME_OTHER", "env-variable")], "", "")]
    #[case::configured_url(&[], "http://localhost:8888", "http://localhost:8888")]
    #[case::configured_url_wins(
        &[("HTTPS_PROXY", "http://other.proxy:9999")],
        "http://localhost:8888",
        "http://localhost:8888"
    )]
    #[case::https_proxy_env(&[("HTTPS_PROXY", "http://other.proxy:9999")], "", "http://other.proxy:9999")]
    #[case::http_proxy_env(&[("HTTP_PROXY", "http://other.proxy:9999")], "", "http://other.proxy:9999")]
    #[case::https_proxy_first(
        &[("HTTPS_PROXY", "http://one.proxy:9999"), ("HTTP_PROXY", "http://other.proxy:9999")],
        "",
        "http://one.proxy:9999"
    )]
    fn proxy_url_resolution(
        #[case] env_values: &[(&'static str, &'static str)],
        #[case] configured: &str,
        #[case] expected: &str,
    ) {
        let config = ProxyConfig::new(configured)
            .unwrap()
            .with_env_aware_url(|name| {
                env_values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| value.to_string())
                    .ok_or(VarError::NotPresent)
            })
            .unwrap();

        assert_eq!(config.url, ProxyUrl::try_from(expected).unwrap());
    }

    #[test]
    fn invalid_system_proxy() {
        let result = ProxyConfig::default().with_env_aware_url(|_| Ok("http://".to_string()));
        assert_matches!(result.unwrap_err(), ProxyError::InvalidUrl(s, _) => {
            assert_eq!(s, "http://".to_string())
        });
    }

    #[test]
    fn empty_url_is_no_proxy() {
        assert_eq!(ProxyUrl::try_from("").unwrap(), ProxyUrl::default());
        assert!(ProxyConfig::new("").unwrap().is_empty());
    }
}
