//! `ApiService` trait and the reqwest-backed `HttpApiClient`.
//!
//! Every method issues exactly one request and either returns the server's
//! own payload (including `{success: false, error}` domain failures) or
//! fails with an [`ApiError`] transport error. The client performs no input
//! validation and no retries; both belong to the callers.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ApiConfig;

use super::types::{ExamplesResponse, QueryResponse, SchemaResponse};

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Transport-level failures. Domain failures never appear here; they travel
/// inside the response payloads.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or connection error.
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Non-2xx status with no parseable body.
    #[error("server returned status {0}")]
    Status(u16),

    /// A 2xx response whose body could not be parsed as expected JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ApiService trait
// ---------------------------------------------------------------------------

/// Async interface to the remote query service.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (wrapped in `Arc<dyn ApiService>`). The production implementation is
/// [`HttpApiClient`]; tests substitute mocks.
#[async_trait]
pub trait ApiService: Send + Sync {
    /// Probe backend reachability. Any 2xx counts as healthy.
    async fn health_check(&self) -> Result<(), ApiError>;

    /// Submit a natural-language question. The caller must pass trimmed,
    /// non-empty text.
    async fn submit_text_query(&self, text: &str) -> Result<QueryResponse, ApiError>;

    /// Submit recorded audio as a multipart upload. The caller must pass a
    /// non-empty payload.
    async fn submit_voice_query(&self, audio: Vec<u8>) -> Result<QueryResponse, ApiError>;

    /// Fetch the database schema.
    async fn fetch_schema(&self) -> Result<SchemaResponse, ApiError>;

    /// Fetch the canned example questions.
    async fn fetch_examples(&self) -> Result<ExamplesResponse, ApiError>;

    /// Execute a raw SQL statement. The caller must pass non-empty SQL.
    async fn execute_raw_sql(&self, sql: &str) -> Result<QueryResponse, ApiError>;
}

// ---------------------------------------------------------------------------
// HttpApiClient
// ---------------------------------------------------------------------------

/// Reqwest-backed [`ApiService`] implementation.
///
/// All connection details (`base_url`, `timeout_secs`) come exclusively from
/// the [`ApiConfig`] passed to [`HttpApiClient::from_config`].
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    /// Build an `HttpApiClient` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Decode a response body, preserving the domain/transport distinction:
    /// a body that parses as `T` is returned as-is even on a non-2xx status
    /// (the server expresses domain failures as JSON error payloads with
    /// 4xx/5xx statuses); a non-2xx status without a parseable body is a
    /// transport error.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Ok(value),
            Err(e) if status.is_success() => Err(ApiError::Parse(e.to_string())),
            Err(_) => Err(ApiError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl ApiService for HttpApiClient {
    async fn health_check(&self) -> Result<(), ApiError> {
        let resp = self.client.get(self.url("/api/health")).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Status(resp.status().as_u16()))
        }
    }

    async fn submit_text_query(&self, text: &str) -> Result<QueryResponse, ApiError> {
        let body = serde_json::json!({ "query": text });
        let resp = self
            .client
            .post(self.url("/api/query"))
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn submit_voice_query(&self, audio: Vec<u8>) -> Result<QueryResponse, ApiError> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let resp = self
            .client
            .post(self.url("/api/voice"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn fetch_schema(&self) -> Result<SchemaResponse, ApiError> {
        let resp = self.client.get(self.url("/api/schema")).send().await?;
        Self::decode(resp).await
    }

    async fn fetch_examples(&self) -> Result<ExamplesResponse, ApiError> {
        let resp = self.client.get(self.url("/api/examples")).send().await?;
        Self::decode(resp).await
    }

    async fn execute_raw_sql(&self, sql: &str) -> Result<QueryResponse, ApiError> {
        let body = serde_json::json!({ "sql": sql });
        let resp = self
            .client
            .post(self.url("/api/sql"))
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_builds_without_panic() {
        let _client = HttpApiClient::from_config(&ApiConfig::default());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:5000/".into(),
            timeout_secs: 30,
        };
        let client = HttpApiClient::from_config(&config);
        assert_eq!(client.url("/api/health"), "http://localhost:5000/api/health");
    }

    /// Verify that `HttpApiClient` is object-safe (usable as `dyn ApiService`).
    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn ApiService> =
            Box::new(HttpApiClient::from_config(&ApiConfig::default()));
        drop(client);
    }
}
