//! Preview image generation client
//!
//! Talks to an image generation endpoint that accepts
//! `{"prompt", "size", "response_format": "b64_json"}` and answers with
//! `{"data": [{"b64_json": "..."}]}`.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("adn-conv/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum VisualAssetError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Service returned no image")]
    EmptyResponse,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation task aborted: {0}")]
    TaskAborted(String),
}

/// Anything that can turn a prompt into image bytes
#[async_trait]
pub trait VisualAssetService: Send + Sync {
    async fn generate(&self, prompt: &str, size: &str) -> Result<Vec<u8>, VisualAssetError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    size: &'a str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

pub struct HttpVisualAssetClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpVisualAssetClient {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self, VisualAssetError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| VisualAssetError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VisualAssetService for HttpVisualAssetClient {
    async fn generate(&self, prompt: &str, size: &str) -> Result<Vec<u8>, VisualAssetError> {
        let body = GenerateRequest {
            prompt,
            size,
            response_format: "b64_json",
        };

        tracing::debug!(endpoint = %self.endpoint, size = size, "Requesting preview image");

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VisualAssetError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisualAssetError::ApiError(status.as_u16(), error_text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VisualAssetError::ParseError(e.to_string()))?;

        decode_first_image(parsed)
    }
}

fn decode_first_image(response: GenerateResponse) -> Result<Vec<u8>, VisualAssetError> {
    let encoded = response
        .data
        .into_iter()
        .find_map(|image| image.b64_json)
        .ok_or(VisualAssetError::EmptyResponse)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| VisualAssetError::ParseError(format!("invalid base64 image: {}", e)))?;

    if bytes.is_empty() {
        return Err(VisualAssetError::EmptyResponse);
    }
    Ok(bytes)
}
