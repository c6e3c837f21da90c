//! HTTP client shared by the pRPC and REST bindings.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Anti-XSSI prefix prepended to JSON by pRPC and Gerrit.
const XSSI_PREFIX: &str = ")]}'";

/// HTTP client for REST endpoints and raw artifact downloads.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    access_token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("ci-triage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner,
            access_token: config.access_token.clone(),
        })
    }

    pub(crate) fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.authorize(self.inner.post(url))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET a body as text. `None` on 404.
    ///
    /// Signed download URLs must not carry credentials, so `authorized`
    /// is false for those.
    pub async fn get_text(&self, url: &str, authorized: bool) -> Result<Option<String>, ClientError> {
        debug!(url = %url, "GET request");

        let request = self.inner.get(url);
        let request = if authorized { self.authorize(request) } else { request };
        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ClientError::Rpc {
                code: crate::error::code_from_http(response.status()),
                message: format!("HTTP {}: {}", response.status(), url),
            });
        }

        Ok(Some(response.text().await?))
    }

    /// GET JSON from an endpoint that may prefix it with the XSSI guard.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, ClientError> {
        match self.get_text(url, true).await? {
            Some(body) => Ok(Some(parse_json(&body)?)),
            None => Ok(None),
        }
    }
}

/// `https://<host>`, or `host` itself when it already has a scheme.
pub(crate) fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Drop the XSSI guard line, if present.
pub fn strip_xssi_prefix(body: &str) -> &str {
    body.strip_prefix(XSSI_PREFIX)
        .map(str::trim_start)
        .unwrap_or(body)
}

/// Decode a JSON body, tolerating the XSSI guard.
pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    Ok(serde_json::from_str(strip_xssi_prefix(body))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_xssi_prefix() {
        assert_eq!(strip_xssi_prefix(")]}'\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_xssi_prefix("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_json_error_is_serialization() {
        let result: Result<serde_json::Value, _> = parse_json(")]}'\nnot json");
        assert!(matches!(result, Err(ClientError::Serialization(_))));
    }
}
