//! The HTTP transport contract the audit client is built against.
//!
//! Per spec.md §6 this is consumed, not reimplemented, as a general
//! concern: `post(endpoint, body) -> response` and `get(url, None) ->
//! response`. This module supplies the trait plus one concrete
//! `reqwest`-backed implementation, in the shape of the teacher's
//! `ColibriClient` request plumbing (header injection, timeout, non-2xx
//! mapped to an error).

use crate::error::{AuditError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// A decoded JSON response from either endpoint kind.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.body).map_err(AuditError::from)
    }
}

/// The transport boundary the audit client is written against.
///
/// `post` hits a named server endpoint (`log`, `search`, `root`) relative
/// to the client's configured origin; `get` fetches an arbitrary absolute
/// URL (used for publication-network transaction bodies).
pub trait Transport {
    async fn post(&self, endpoint: &str, body: Value) -> Result<RawResponse>;
    async fn get(&self, url: &str) -> Result<RawResponse>;
}

/// `reqwest`-backed transport against a Pangea-style audit service.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_domain: String,
    token: String,
    config_id: Option<String>,
}

impl ReqwestTransport {
    pub fn new(base_domain: impl Into<String>, token: impl Into<String>, config_id: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_domain: base_domain.into(),
            token: token.into(),
            config_id,
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        let base = self.base_domain.trim_end_matches('/');
        format!("https://audit.{base}/v1/{endpoint}")
    }

    async fn finish(&self, response: reqwest::Response) -> Result<RawResponse> {
        let status_code = response.status().as_u16();
        let success = response.status().is_success();
        let text = response.text().await?;

        if !success {
            return Err(AuditError::TransportError(format!(
                "HTTP {status_code}: {text}"
            )));
        }

        let body: Value = serde_json::from_str(&text)?;
        Ok(RawResponse { status_code, body })
    }
}

impl Transport for ReqwestTransport {
    async fn post(&self, endpoint: &str, body: Value) -> Result<RawResponse> {
        let mut request = self
            .client
            .post(self.endpoint_url(endpoint))
            .bearer_auth(&self.token)
            .json(&body);

        if let Some(config_id) = &self.config_id {
            request = request.header("X-Pangea-Audit-Config-ID", config_id);
        }

        let response = request.send().await?;
        self.finish(response).await
    }

    async fn get(&self, url: &str) -> Result<RawResponse> {
        let response = self.client.get(url).bearer_auth(&self.token).send().await?;
        self.finish(response).await
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// An in-memory transport for unit/integration tests: pre-load
    /// responses keyed by endpoint name (for `post`) or URL (for `get`).
    #[derive(Default)]
    pub struct MockTransport {
        pub post_responses: Mutex<HashMap<String, RawResponse>>,
        pub get_responses: Mutex<HashMap<String, RawResponse>>,
        pub posts_seen: Mutex<Vec<(String, Value)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_post_response(self, endpoint: &str, body: Value) -> Self {
            self.post_responses
                .lock()
                .unwrap()
                .insert(endpoint.to_string(), RawResponse { status_code: 200, body });
            self
        }

        pub fn with_get_response(self, url: &str, body: Value) -> Self {
            self.get_responses
                .lock()
                .unwrap()
                .insert(url.to_string(), RawResponse { status_code: 200, body });
            self
        }
    }

    impl Transport for MockTransport {
        async fn post(&self, endpoint: &str, body: Value) -> Result<RawResponse> {
            self.posts_seen.lock().unwrap().push((endpoint.to_string(), body));
            self.post_responses
                .lock()
                .unwrap()
                .get(endpoint)
                .cloned()
                .ok_or_else(|| {
                    AuditError::TransportError(format!("no mock response configured for endpoint '{endpoint}'"))
                })
        }

        async fn get(&self, url: &str) -> Result<RawResponse> {
            self.get_responses.lock().unwrap().get(url).cloned().ok_or_else(|| {
                AuditError::TransportError(format!("no mock response configured for url '{url}'"))
            })
        }
    }
}
