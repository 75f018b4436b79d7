use crate::config::UpstreamConfig;
use crate::record::CameraRecord;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument};

const LOOKUP_PATH: &str = "/map/getCctvInfoById.do";

/// Errors that can occur while reaching the upstream.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP client construction failed: {0}")]
    Client(String),

    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    #[error("Upstream request failed: {0}")]
    Http(String),

    #[error("Upstream returned status {status}")]
    Status { status: u16 },

    #[error("Upstream response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Http(e.to_string())
        }
    }
}

/// Source of camera records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch the raw record for one camera ID
    async fn fetch(&self, cctv_id: &str) -> Result<CameraRecord, FetchError>;
}

/// Fetcher backed by the UTIC open data endpoint
#[derive(Debug, Clone)]
pub struct UticClient {
    client: Client,
    lookup_url: String,
    api_key: String,
}

impl UticClient {
    /// Create a new client
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.referer).map_err(|e| FetchError::Client(e.to_string()))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FetchError::Client(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            lookup_url: format!("{}{}", config.base_url.trim_end_matches('/'), LOOKUP_PATH),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl MetadataFetcher for UticClient {
    #[instrument(skip(self))]
    async fn fetch(&self, cctv_id: &str) -> Result<CameraRecord, FetchError> {
        debug!(
            url = %format!("{}?cctvId={}&key=***", self.lookup_url, cctv_id),
            "Requesting camera metadata"
        );

        let started = Instant::now();
        let result = self
            .client
            .get(&self.lookup_url)
            .query(&[("cctvId", cctv_id), ("key", self.api_key.as_str())])
            .send()
            .await
            .and_then(|response| response.error_for_status());
        metrics::histogram!("resolver.upstream.duration_seconds")
            .record(started.elapsed().as_secs_f64());

        let response = result?;
        let status = response.status();
        let body = response.text().await?;

        debug!(status = status.as_u16(), body = %body, "Upstream response");

        let value: Value =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        if !value.is_object() {
            return Err(FetchError::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }

        serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
