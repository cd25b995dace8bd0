//! YouTube Data API interaction module
//!
//! This module provides the plumbing for talking to the YouTube Data API v3:
//! bearer authentication, the HTTP wrapper and the video endpoints.
//!
//! # Module Structure
//!
//! - [`auth`] - Static bearer access token supplied at provider configuration
//! - [`client`] - Video endpoints (list by id, update by parts)
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use ytvideo::youtube::{auth::AccessToken, client::YoutubeClient};
//!
//! async fn example() -> Result<(), ytvideo::provider::GatewayError> {
//!     let token = AccessToken::new("ya29....").unwrap();
//!     let client = YoutubeClient::new(token, &Default::default())?;
//!     let body = client.list_videos("dQw4w9WgXcQ", "snippet,statistics").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
