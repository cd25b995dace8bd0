//! HTTP utilities for YouTube REST API calls

use crate::provider::error::GatewayError;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = floor_char_boundary(body, MAX_LOG_BODY_LENGTH);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Pull `error.message` out of a Google API error body, falling back to the
/// canonical reason phrase for the status
fn extract_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        })
}

/// Map a non-success status to the gateway taxonomy
pub fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let message = extract_error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Auth {
            status: status.as_u16(),
            message,
        },
        _ => GatewayError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// HTTP client wrapper for YouTube API calls
#[derive(Clone)]
pub struct YoutubeHttpClient {
    client: Client,
}

impl YoutubeHttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request to the YouTube API
    pub async fn get(&self, url: &Url, token: &str) -> Result<Value, GatewayError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Make a PUT request with a JSON body to the YouTube API
    pub async fn put(&self, url: &Url, token: &str, body: &Value) -> Result<Value, GatewayError> {
        tracing::debug!("PUT {}", url);

        let response = self
            .client
            .put(url.clone())
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn read_json(response: Response) -> Result<Value, GatewayError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(status_error(status, &body));
        }

        // Handle empty response
        if body.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}
