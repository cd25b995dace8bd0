//! Reconciliation core
//!
//! This module maps a typed, schema-validated declaration of one YouTube
//! video onto the two remote calls the API offers for it, and reports the
//! outcome as persisted state plus diagnostics.
//!
//! # Architecture
//!
//! - [`schema`] - Attribute sets loaded from embedded JSON
//! - [`declaration`] - Decoding/validating declarations, persisted state
//! - [`diagnostics`] - Per-operation warning/error collector
//! - [`gateway`] - Fetch-by-id / apply-by-parts contract and its YouTube implementation
//! - [`reconciler`] - Read / Update / Import state machine for the video resource and data source
//! - [`session`] - Provider configuration and gateway ownership
//!
//! # Lifecycle
//!
//! Videos are never created and never deleted. The only way in is an import
//! of an existing video id; removing a video from configuration only drops
//! local tracking.
//!
//! # Example
//!
//! ```ignore
//! use ytvideo::provider::{OperationContext, Provider};
//! use serde_json::json;
//!
//! async fn example() {
//!     let mut provider = Provider::new("dev");
//!     let diags = provider.configure(&json!({"access_token": "ya29...."}));
//!     assert!(!diags.has_error());
//!
//!     let videos = provider.video_resource().unwrap();
//!     let response = videos.import_state(&OperationContext::new(), "dQw4w9WgXcQ").await;
//!     println!("{:?}", response.state);
//! }
//! ```

pub mod declaration;
pub mod diagnostics;
pub mod error;
pub mod gateway;
pub mod reconciler;
pub mod schema;
pub mod session;

pub use declaration::{Declaration, DeclarationSource, PersistedState};
pub use diagnostics::{Diagnostic, Diagnostics, ErrorClass, Severity};
pub use error::{GatewayError, ReconcileError, SessionError, ValidationError};
pub use gateway::{Part, PartSet, RemoteSnapshot, VideoGateway};
pub use reconciler::{OperationContext, OperationResponse, Phase, VideoDataSource, VideoResource};
pub use session::{Provider, ProviderMetadata, ProviderSession};
