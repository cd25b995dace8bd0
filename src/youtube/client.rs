//! YouTube Client
//!
//! Main client for the video collection of the YouTube Data API, combining
//! the bearer credential and HTTP functionality.

use super::auth::AccessToken;
use super::http::YoutubeHttpClient;
use crate::provider::error::GatewayError;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Production endpoint of the YouTube Data API
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`YoutubeClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("ytvideo/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Main YouTube client
///
/// Cloning is cheap and clones share the credential-rejected flag, so one
/// 401 stops every invocation holding the same session.
#[derive(Clone)]
pub struct YoutubeClient {
    http: YoutubeHttpClient,
    token: AccessToken,
    base_url: Url,
    credential_rejected: Arc<AtomicBool>,
}

impl YoutubeClient {
    /// Create a new YouTube client
    pub fn new(token: AccessToken, options: &ClientOptions) -> Result<Self, GatewayError> {
        let http = YoutubeHttpClient::new(&options.user_agent, options.timeout)?;

        Ok(Self {
            http,
            token,
            base_url: parse_base_url(&options.base_url)?,
            credential_rejected: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the API has refused the session's token
    pub fn credential_rejected(&self) -> bool {
        self.credential_rejected.load(Ordering::Acquire)
    }

    /// Build the videos collection URL with its query parameters
    pub fn videos_url(&self, parts: &str, id: Option<&str>) -> Result<Url, GatewayError> {
        let mut url = self
            .base_url
            .join("videos")
            .map_err(|e| GatewayError::InvalidRequest(format!("bad videos URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("part", parts);
            if let Some(id) = id {
                query.append_pair("id", id);
            }
        }
        Ok(url)
    }

    /// `videos.list` filtered to a single id
    pub async fn list_videos(&self, id: &str, parts: &str) -> Result<Value, GatewayError> {
        self.ensure_credential()?;
        let url = self.videos_url(parts, Some(id))?;
        let result = self.http.get(&url, self.token.secret()).await;
        self.observe(result)
    }

    /// `videos.update` for the given parts
    pub async fn update_video(&self, parts: &str, body: &Value) -> Result<Value, GatewayError> {
        self.ensure_credential()?;
        let url = self.videos_url(parts, None)?;
        let result = self.http.put(&url, self.token.secret(), body).await;
        self.observe(result)
    }

    fn ensure_credential(&self) -> Result<(), GatewayError> {
        if self.credential_rejected() {
            return Err(GatewayError::CredentialRejected);
        }
        Ok(())
    }

    fn observe(&self, result: Result<Value, GatewayError>) -> Result<Value, GatewayError> {
        if let Err(GatewayError::Auth { status: 401, .. }) = &result {
            tracing::warn!("Access token rejected, blocking further API calls for this session");
            self.credential_rejected.store(true, Ordering::Release);
        }
        result
    }
}

/// The base must end with a slash or `Url::join` drops its last segment
fn parse_base_url(raw: &str) -> Result<Url, GatewayError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid API base URL {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> YoutubeClient {
        let options = ClientOptions {
            base_url: base.to_string(),
            ..ClientOptions::default()
        };
        YoutubeClient::new(AccessToken::new("token").unwrap(), &options).unwrap()
    }

    #[test]
    fn test_videos_url_with_id() {
        let url = client(DEFAULT_BASE_URL)
            .videos_url("snippet,statistics", Some("abc123"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/youtube/v3/videos?part=snippet%2Cstatistics&id=abc123"
        );
    }

    #[test]
    fn test_base_url_without_trailing_slash() {
        let url = client("http://127.0.0.1:8080/youtube/v3")
            .videos_url("snippet", None)
            .unwrap();
        assert_eq!(url.path(), "/youtube/v3/videos");
        assert_eq!(url.query(), Some("part=snippet"));
    }

    #[test]
    fn test_invalid_base_url() {
        let options = ClientOptions {
            base_url: "not a url".to_string(),
            ..ClientOptions::default()
        };
        let result = YoutubeClient::new(AccessToken::new("t").unwrap(), &options);
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn test_id_is_percent_encoded() {
        let url = client(DEFAULT_BASE_URL)
            .videos_url("id", Some("a b&c"))
            .unwrap();
        assert!(url.as_str().ends_with("id=a+b%26c"));
    }
}
