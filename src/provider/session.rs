//! Provider Session
//!
//! [`Provider`] is the host-facing entry point. Configuring it turns the
//! bootstrap access token into a [`ProviderSession`], which builds the one
//! gateway shared by every resource and data source instance. Instances get
//! the gateway explicitly at construction; an unconfigured provider hands out
//! no instances at all.

use super::declaration::{Declaration, DeclarationSource};
use super::diagnostics::{Diagnostics, ErrorClass};
use super::error::SessionError;
use super::gateway::VideoGateway;
use super::reconciler::{VideoDataSource, VideoResource};
use super::schema::{self, Schema, PROVIDER_TYPE_NAME};
use crate::youtube::auth::AccessToken;
use crate::youtube::client::{ClientOptions, YoutubeClient};
use serde_json::Value;
use std::sync::Arc;

const SUMMARY_CONFIGURE: &str = "Unable to Create YouTube API Client";
const SUMMARY_UNCONFIGURED: &str = "Provider not configured";

/// Configured session holding the shared gateway
#[derive(Clone)]
pub struct ProviderSession {
    gateway: Arc<dyn VideoGateway>,
}

impl ProviderSession {
    /// Build the production gateway from the bootstrap token
    pub fn connect(access_token: &str, options: &ClientOptions) -> Result<Self, SessionError> {
        let token = AccessToken::new(access_token).ok_or(SessionError::MissingCredential)?;
        let client = YoutubeClient::new(token, options).map_err(SessionError::Client)?;
        tracing::info!("YouTube API client ready for {}", client.base_url());
        Ok(Self::with_gateway(Arc::new(client)))
    }

    /// Use an already built gateway
    pub fn with_gateway(gateway: Arc<dyn VideoGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> Arc<dyn VideoGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn video_resource(&self) -> VideoResource {
        VideoResource::new(self.gateway())
    }

    pub fn video_data_source(&self) -> VideoDataSource {
        VideoDataSource::new(self.gateway())
    }
}

/// Provider name and version as reported to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub type_name: String,
    pub version: String,
}

/// Host-facing provider
pub struct Provider {
    version: String,
    options: ClientOptions,
    session: Option<ProviderSession>,
}

impl Provider {
    /// `version` is the release version, "dev" for local builds and "test"
    /// under acceptance tests
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            options: ClientOptions::default(),
            session: None,
        }
    }

    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            version: self.version.clone(),
        }
    }

    pub fn schema() -> &'static Schema {
        schema::provider_schema()
    }

    pub fn resource_types() -> Vec<String> {
        vec![VideoResource::type_name()]
    }

    pub fn data_source_types() -> Vec<String> {
        vec![VideoDataSource::type_name()]
    }

    /// Decode the provider configuration and build the session.
    /// Any error leaves the provider unconfigured, dropping an earlier session.
    pub fn configure(&mut self, config: &Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        self.session = None;

        let declaration =
            match Declaration::decode(Self::schema(), config, DeclarationSource::State) {
                Ok(declaration) => declaration,
                Err(errors) => {
                    for err in errors {
                        diagnostics.add_session_error(SUMMARY_CONFIGURE, &err.into());
                    }
                    return diagnostics;
                }
            };

        let token = declaration.get_str("access_token").unwrap_or_default();
        match ProviderSession::connect(token, &self.options) {
            Ok(session) => self.session = Some(session),
            Err(err) => {
                tracing::error!("Provider configuration failed: {}", err);
                diagnostics.add_session_error(SUMMARY_CONFIGURE, &err);
            }
        }
        diagnostics
    }

    /// Configure with a caller-supplied gateway instead of the YouTube client
    pub fn configure_with_gateway(&mut self, gateway: Arc<dyn VideoGateway>) {
        self.session = Some(ProviderSession::with_gateway(gateway));
    }

    pub fn is_configured(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ProviderSession> {
        self.session.as_ref()
    }

    pub fn video_resource(&self) -> Result<VideoResource, Diagnostics> {
        self.require_session().map(ProviderSession::video_resource)
    }

    pub fn video_data_source(&self) -> Result<VideoDataSource, Diagnostics> {
        self.require_session().map(ProviderSession::video_data_source)
    }

    fn require_session(&self) -> Result<&ProviderSession, Diagnostics> {
        self.session.as_ref().ok_or_else(|| {
            let mut diagnostics = Diagnostics::new();
            diagnostics.add_error(
                ErrorClass::Configuration,
                SUMMARY_UNCONFIGURED,
                "The youtube provider must be configured with a valid access_token before videos can be read or updated.",
            );
            diagnostics
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata() {
        let provider = Provider::new("test");
        assert_eq!(
            provider.metadata(),
            ProviderMetadata {
                type_name: "youtube".to_string(),
                version: "test".to_string()
            }
        );
        assert_eq!(Provider::resource_types(), vec!["youtube_video".to_string()]);
        assert_eq!(Provider::data_source_types(), vec!["youtube_video".to_string()]);
    }

    #[test]
    fn test_empty_token_is_fatal() {
        let mut provider = Provider::new("test");
        let diags = provider.configure(&json!({"access_token": ""}));
        assert!(diags.has_error_class(ErrorClass::Configuration));
        assert!(!provider.is_configured());
        assert!(provider.video_resource().is_err());
        assert!(provider.video_data_source().is_err());
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut provider = Provider::new("test");
        let diags = provider.configure(&json!({}));
        assert!(diags.has_error());
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_unknown_provider_attribute_is_fatal() {
        let mut provider = Provider::new("test");
        let diags = provider.configure(&json!({"access_token": "t", "api_key": "k"}));
        assert!(diags.has_error_class(ErrorClass::Configuration));
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_valid_token_configures() {
        let mut provider = Provider::new("test");
        let diags = provider.configure(&json!({"access_token": "ya29.token"}));
        assert!(diags.is_empty(), "{}", diags);
        assert!(provider.is_configured());
        assert!(provider.video_resource().is_ok());
    }

    #[test]
    fn test_reconfigure_with_bad_token_drops_session() {
        let mut provider = Provider::new("test");
        provider.configure(&json!({"access_token": "ya29.token"}));
        assert!(provider.is_configured());
        provider.configure(&json!({"access_token": "  "}));
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_diagnostics_never_leak_token() {
        let mut provider = Provider::new("test");
        let diags = provider.configure(&json!({"access_token": 12345}));
        assert!(diags.has_error());
        assert!(!diags.to_string().contains("12345"));
    }
}
