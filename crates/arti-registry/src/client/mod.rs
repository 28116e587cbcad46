//! HTTP primitives against the artifactory registry.
//!
//! One `reqwest` client carries the ambient proxy/TLS/timeout policy for
//! every request a resolution session makes. Requests resolve only on a
//! 2xx status; everything else is mapped into the error taxonomy so
//! callers can dispatch on status without touching transport details.

use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Proxy, Response};
use serde::Deserialize;

use arti_config::Config;
use arti_core::ArtiError;

use crate::RegistryResult;

/// HTTP client for registry metadata and archive endpoints
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
}

impl RegistryClient {
    /// Build a client honoring the ambient proxy, TLS and timeout policy.
    pub fn new(config: &Config) -> RegistryResult<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.strict_ssl)
            .gzip(true)
            .user_agent(concat!("arti/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::http(proxy).map_err(|e| ArtiError::Config {
                message: format!("invalid proxy '{proxy}': {e}"),
            })?);
        }
        if let Some(proxy) = &config.https_proxy {
            builder = builder.proxy(Proxy::https(proxy).map_err(|e| ArtiError::Config {
                message: format!("invalid httpsProxy '{proxy}': {e}"),
            })?);
        }

        let client = builder.build().map_err(|e| ArtiError::Config {
            message: format!("failed to create HTTP client: {e}"),
        })?;

        Ok(Self { client })
    }

    /// HEAD request resolving only on a 2xx status.
    pub async fn head(&self, url: &str, headers: HeaderMap) -> RegistryResult<Response> {
        let response = self
            .client
            .head(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;
        check_status(url, response)
    }

    /// GET request resolving only on a 2xx status.
    pub async fn get(&self, url: &str) -> RegistryResult<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;
        check_status(url, response)
    }

    /// GET request returning the response body as text.
    pub async fn get_text(&self, url: &str) -> RegistryResult<String> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| transport_error(url, &e))
    }

    /// Fetch the registry's JSON error body for a URL that already
    /// failed, regardless of the status it fails with again. Returns the
    /// first message, or `None` when no parseable body comes back.
    pub async fn error_message(&self, url: &str) -> Option<String> {
        let response = self.client.get(url).send().await.ok()?;
        let body: ErrorBody = response.json().await.ok()?;
        body.into_message()
    }
}

fn check_status(url: &str, response: Response) -> RegistryResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ArtiError::InvalidResponse {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

/// Map a transport-level failure (DNS, connect, timeout) into the error
/// taxonomy, preserving a code-like class when one is recognizable.
pub fn transport_error(url: &str, error: &reqwest::Error) -> ArtiError {
    let code = if error.is_timeout() {
        Some("ETIMEDOUT".to_string())
    } else if error.is_connect() {
        Some("ECONNREFUSED".to_string())
    } else {
        None
    };

    ArtiError::Transport {
        url: url.to_string(),
        message: error.to_string(),
        code,
    }
}

/// Registry error payload: `{"errors": [{"message": ...}]}` in the
/// common case, `{"message": ...}` in the flat one.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorItem>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.errors
            .into_iter()
            .find_map(|item| item.message)
            .or(self.message)
    }
}
