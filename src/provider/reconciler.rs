//! Reconciler
//!
//! Drives Read / Update / Import for the video resource and Read for the
//! video data source. Every public operation:
//!
//! - owns a fresh [`Diagnostics`] for the call,
//! - fetches the video again (no caching, the video may change at any time),
//! - either returns persisted state with no errors, or no state and at least
//!   one error diagnostic.
//!
//! Per call the operation walks
//! `Pending -> Fetching -> {Reconciling | NotFound | GatewayFailed} -> {Persisted | Failed}`,
//! and the walked phases are returned with the response.

use super::declaration::{Declaration, DeclarationSource, PersistedState};
use super::diagnostics::{Diagnostics, ErrorClass};
use super::error::{GatewayError, ReconcileError, ValidationError};
use super::gateway::{Part, PartSet, RemoteSnapshot, VideoGateway};
use super::schema::{self, Schema};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

const SUMMARY_READ: &str = "Unable to get Video";
const SUMMARY_UPDATE: &str = "Unable to update Video";
const SUMMARY_IMPORT: &str = "Unable to import Video";
const SUMMARY_CREATE: &str = "Creation not supported";
const SUMMARY_INVALID: &str = "Invalid Video declaration";

/// Snippet fields the video resource writes back, keyed by attribute name.
/// Both title and description are propagated on update.
const MUTABLE_SNIPPET_FIELDS: [(&str, &str); 2] =
    [("title", "title"), ("description", "description")];

/// Invocation context handed in by the host
///
/// Cancelling the token aborts whichever network call is in flight; the
/// operation then fails with a gateway error and persists nothing.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    cancellation: CancellationToken,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Race a gateway call against cancellation
    async fn guard<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        if self.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(GatewayError::Cancelled),
            result = call => result,
        }
    }
}

/// Phase of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Fetching,
    Reconciling,
    NotFound,
    GatewayFailed,
    Persisted,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Reconciling => "reconciling",
            Self::NotFound => "not_found",
            Self::GatewayFailed => "gateway_failed",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Progress {
    phases: Vec<Phase>,
}

impl Progress {
    fn new() -> Self {
        Self {
            phases: vec![Phase::Pending],
        }
    }

    fn current(&self) -> Phase {
        self.phases.last().copied().unwrap_or(Phase::Pending)
    }

    fn advance(&mut self, next: Phase) {
        tracing::trace!(from = %self.current(), to = %next, "phase");
        self.phases.push(next);
    }
}

/// Result of one operation: persisted state on success, diagnostics always
#[derive(Debug)]
pub struct OperationResponse {
    pub state: Option<PersistedState>,
    pub diagnostics: Diagnostics,
    pub phases: Vec<Phase>,
}

impl OperationResponse {
    pub fn succeeded(&self) -> bool {
        !self.diagnostics.has_error()
    }

    pub fn final_phase(&self) -> Phase {
        self.phases.last().copied().unwrap_or(Phase::Pending)
    }

    fn finish(
        summary: &str,
        mut progress: Progress,
        result: Result<PersistedState, ReconcileError>,
    ) -> Self {
        let mut diagnostics = Diagnostics::new();
        match result {
            Ok(state) => {
                progress.advance(Phase::Persisted);
                tracing::info!("operation persisted state");
                Self {
                    state: Some(state),
                    diagnostics,
                    phases: progress.phases,
                }
            }
            Err(err) => {
                if let ReconcileError::Gateway(gateway_err) = &err {
                    if matches!(progress.current(), Phase::Fetching | Phase::Reconciling) {
                        progress.advance(if gateway_err.is_not_found() {
                            Phase::NotFound
                        } else {
                            Phase::GatewayFailed
                        });
                    }
                }
                progress.advance(Phase::Failed);
                let summary = match &err {
                    ReconcileError::Validation(_) => SUMMARY_INVALID,
                    _ => summary,
                };
                tracing::info!("operation failed: {}", err);
                diagnostics.add_reconcile_error(summary, &err);
                Self {
                    state: None,
                    diagnostics,
                    phases: progress.phases,
                }
            }
        }
    }
}

fn operation_span(operation: &'static str, type_name: &str) -> tracing::Span {
    tracing::info_span!(
        "operation",
        operation,
        type_name,
        operation_id = %Uuid::new_v4(),
        video_id = tracing::field::Empty
    )
}

async fn fetch_full(
    gateway: &dyn VideoGateway,
    ctx: &OperationContext,
    progress: &mut Progress,
    id: &str,
) -> Result<RemoteSnapshot, ReconcileError> {
    progress.advance(Phase::Fetching);
    tracing::debug!(video_id = id, "fetching video");
    let parts = PartSet::all();
    let snapshot = ctx.guard(gateway.fetch_by_id(id, &parts)).await?;
    progress.advance(Phase::Reconciling);
    Ok(snapshot)
}

fn snippet_str(snapshot: &RemoteSnapshot, field: &str) -> String {
    snapshot
        .part_field(Part::Snippet, field)
        .unwrap_or_default()
        .to_string()
}

/// A string attribute that must be present; empty strings are allowed
fn declared_str<'a>(declaration: &'a Declaration, name: &str) -> Result<&'a str, ValidationError> {
    declaration
        .get_str(name)
        .ok_or_else(|| ValidationError::new(name, "required attribute is missing"))
}

/// The video resource: partially-mutable projection of one video
///
/// There is no create and no remote delete. A video is brought under
/// management with [`import_state`](Self::import_state) and released by
/// [`delete`](Self::delete), which only drops local tracking.
#[derive(Clone)]
pub struct VideoResource {
    gateway: Arc<dyn VideoGateway>,
}

impl VideoResource {
    pub fn new(gateway: Arc<dyn VideoGateway>) -> Self {
        Self { gateway }
    }

    pub fn type_name() -> String {
        schema::type_name(schema::VIDEO)
    }

    pub fn schema() -> &'static Schema {
        schema::video_resource_schema()
    }

    /// Refresh persisted state from the remote video
    pub async fn read(&self, ctx: &OperationContext, prior_state: &Value) -> OperationResponse {
        let type_name = Self::type_name();
        async {
            let mut progress = Progress::new();
            let decoded =
                Declaration::decode(Self::schema(), prior_state, DeclarationSource::State);
            let result = match decoded {
                Ok(declaration) => self.read_declaration(ctx, &mut progress, declaration).await,
                Err(errors) => Err(errors.into()),
            };
            OperationResponse::finish(SUMMARY_READ, progress, result)
        }
        .instrument(operation_span("read", &type_name))
        .await
    }

    /// Seed a declaration with only the id and read it
    pub async fn import_state(&self, ctx: &OperationContext, id: &str) -> OperationResponse {
        let type_name = Self::type_name();
        async {
            let mut progress = Progress::new();
            let result = match self.seed(id) {
                Ok(declaration) => self.read_declaration(ctx, &mut progress, declaration).await,
                Err(err) => Err(err.into()),
            };
            OperationResponse::finish(SUMMARY_IMPORT, progress, result)
        }
        .instrument(operation_span("import", &type_name))
        .await
    }

    /// Push the declared title and description to the remote video
    pub async fn update(&self, ctx: &OperationContext, plan: &Value) -> OperationResponse {
        let type_name = Self::type_name();
        async {
            let mut progress = Progress::new();
            let result = self.update_inner(ctx, &mut progress, plan).await;
            OperationResponse::finish(SUMMARY_UPDATE, progress, result)
        }
        .instrument(operation_span("update", &type_name))
        .await
    }

    /// Always fails: videos can only be imported
    pub async fn create(&self, _ctx: &OperationContext, _config: &Value) -> OperationResponse {
        operation_span("create", &Self::type_name()).in_scope(|| {
            let err = ReconcileError::Unsupported(
                "Please use an import block, as YouTube videos cannot be created by this provider"
                    .to_string(),
            );
            OperationResponse::finish(SUMMARY_CREATE, Progress::new(), Err(err))
        })
    }

    /// Stop tracking the video. The remote video is left untouched and no
    /// API call is made; a warning records that.
    pub async fn delete(&self, _ctx: &OperationContext, prior_state: &Value) -> OperationResponse {
        operation_span("delete", &Self::type_name()).in_scope(|| Self::detach(prior_state))
    }

    fn detach(prior_state: &Value) -> OperationResponse {
        let id = prior_state
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>");
        tracing::warn!(video_id = id, "removing video from state without deleting it remotely");

        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning(
            "Video left in place",
            format!(
                "Video {} was removed from state only. This provider never deletes videos; \
                 delete it in YouTube Studio if that is what you want.",
                id
            ),
        );
        OperationResponse {
            state: None,
            diagnostics,
            phases: vec![Phase::Pending],
        }
    }

    fn seed(&self, id: &str) -> Result<Declaration, ValidationError> {
        if id.is_empty() {
            return Err(ValidationError::new("id", "import identifier must not be empty"));
        }
        let mut declaration = Declaration::empty(Self::schema());
        declaration.set("id", id)?;
        Ok(declaration)
    }

    async fn read_declaration(
        &self,
        ctx: &OperationContext,
        progress: &mut Progress,
        mut declaration: Declaration,
    ) -> Result<PersistedState, ReconcileError> {
        let id = declaration.require_str("id")?.to_string();
        tracing::Span::current().record("video_id", id.as_str());

        let snapshot = fetch_full(self.gateway.as_ref(), ctx, progress, &id).await?;

        declaration.set("title", snippet_str(&snapshot, "title"))?;
        declaration.set("description", snippet_str(&snapshot, "description"))?;
        declaration.set("res", snapshot.encode_part(Part::Snippet))?;
        Ok(declaration.into_state())
    }

    async fn update_inner(
        &self,
        ctx: &OperationContext,
        progress: &mut Progress,
        plan: &Value,
    ) -> Result<PersistedState, ReconcileError> {
        let mut declaration = Declaration::decode(Self::schema(), plan, DeclarationSource::Plan)?;
        let id = declaration.require_str("id")?.to_string();
        tracing::Span::current().record("video_id", id.as_str());
        declaration.require_str("title")?;
        declared_str(&declaration, "description")?;

        let mut snapshot = fetch_full(self.gateway.as_ref(), ctx, progress, &id).await?;

        let Some(Value::Object(snippet)) = snapshot.part_mut(Part::Snippet) else {
            let err = GatewayError::InvalidRequest(format!("video {} has no snippet to update", id));
            return Err(err.into());
        };
        for (attribute, field) in MUTABLE_SNIPPET_FIELDS {
            let value = declared_str(&declaration, attribute)?;
            snippet.insert(field.to_string(), Value::String(value.to_string()));
        }

        let parts = PartSet::only(Part::Snippet);
        tracing::debug!(video_id = id.as_str(), parts = %parts.to_query(), "applying update");
        let updated = ctx
            .guard(self.gateway.apply_partial_update(&parts, &snapshot))
            .await?;

        declaration.set("res", updated.encode())?;
        Ok(declaration.into_state())
    }
}

/// The video data source: read-only projection of every readable part
#[derive(Clone)]
pub struct VideoDataSource {
    gateway: Arc<dyn VideoGateway>,
}

impl VideoDataSource {
    pub fn new(gateway: Arc<dyn VideoGateway>) -> Self {
        Self { gateway }
    }

    pub fn type_name() -> String {
        schema::type_name(schema::VIDEO)
    }

    pub fn schema() -> &'static Schema {
        schema::video_data_source_schema()
    }

    pub async fn read(&self, ctx: &OperationContext, config: &Value) -> OperationResponse {
        let type_name = Self::type_name();
        async {
            let mut progress = Progress::new();
            let result = self.read_inner(ctx, &mut progress, config).await;
            OperationResponse::finish(SUMMARY_READ, progress, result)
        }
        .instrument(operation_span("read_data_source", &type_name))
        .await
    }

    async fn read_inner(
        &self,
        ctx: &OperationContext,
        progress: &mut Progress,
        config: &Value,
    ) -> Result<PersistedState, ReconcileError> {
        let mut declaration = Declaration::decode(Self::schema(), config, DeclarationSource::Config)?;
        let id = declaration.require_str("id")?.to_string();
        tracing::Span::current().record("video_id", id.as_str());

        let snapshot = fetch_full(self.gateway.as_ref(), ctx, progress, &id).await?;

        for part in snapshot.parts().iter() {
            if let Some(attribute) = part.attribute_name() {
                declaration.set(attribute, snapshot.encode_part(part))?;
            }
        }
        declaration.set("res", snapshot.encode())?;
        declaration.set("title", snippet_str(&snapshot, "title"))?;
        declaration.set("description", snippet_str(&snapshot, "description"))?;
        Ok(declaration.into_state())
    }
}

/// Whether a response failed with the given class; convenience for hosts
pub fn failed_with(response: &OperationResponse, class: ErrorClass) -> bool {
    response.state.is_none() && response.diagnostics.has_error_class(class)
}
