//! Remote Resource Gateway
//!
//! The two calls the reconciler makes against the video collection: fetch a
//! video by id with a chosen set of parts, and write back whole parts of a
//! previously fetched video. [`VideoGateway`] is the seam; [`YoutubeClient`]
//! is the production implementation.

use super::error::GatewayError;
use crate::youtube::client::YoutubeClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Independently fetchable / updatable sub-document of a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Part {
    ContentDetails,
    Id,
    LiveStreamingDetails,
    Localizations,
    Player,
    RecordingDetails,
    Snippet,
    Statistics,
    Status,
    TopicDetails,
}

impl Part {
    /// Every part the reconciler reads.
    /// fileDetails, processingDetails and suggestions are owner-only and not requested.
    pub const ALL: [Part; 10] = [
        Part::ContentDetails,
        Part::Id,
        Part::LiveStreamingDetails,
        Part::Localizations,
        Part::Player,
        Part::RecordingDetails,
        Part::Snippet,
        Part::Statistics,
        Part::Status,
        Part::TopicDetails,
    ];

    /// Name used in the `part` query parameter and as the document key
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::ContentDetails => "contentDetails",
            Self::Id => "id",
            Self::LiveStreamingDetails => "liveStreamingDetails",
            Self::Localizations => "localizations",
            Self::Player => "player",
            Self::RecordingDetails => "recordingDetails",
            Self::Snippet => "snippet",
            Self::Statistics => "statistics",
            Self::Status => "status",
            Self::TopicDetails => "topicDetails",
        }
    }

    /// Attribute that carries the encoded sub-document, if any
    pub fn attribute_name(&self) -> Option<&'static str> {
        match self {
            Self::ContentDetails => Some("content_details"),
            Self::Id => None,
            Self::LiveStreamingDetails => Some("live_streaming_details"),
            Self::Localizations => Some("localizations"),
            Self::Player => Some("player"),
            Self::RecordingDetails => Some("recording_details"),
            Self::Snippet => Some("snippet"),
            Self::Statistics => Some("statistics"),
            Self::Status => Some("status"),
            Self::TopicDetails => Some("topic_details"),
        }
    }

    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.api_name() == name)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Ordered set of parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartSet(BTreeSet<Part>);

impl PartSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every readable part
    pub fn all() -> Self {
        Part::ALL.into_iter().collect()
    }

    pub fn only(part: Part) -> Self {
        std::iter::once(part).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Part> + '_ {
        self.0.iter().copied()
    }

    /// Comma-joined API names for the `part` query parameter
    pub fn to_query(&self) -> String {
        self.iter().map(|p| p.api_name()).collect::<Vec<_>>().join(",")
    }
}

impl FromIterator<Part> for PartSet {
    fn from_iter<I: IntoIterator<Item = Part>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// `videos.list` response body, reduced to what the gateway uses
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<Map<String, Value>>,
}

/// One video as observed at one instant
///
/// Sub-documents are kept verbatim so a later update can send them back whole.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    id: String,
    parts: PartSet,
    document: Map<String, Value>,
}

impl RemoteSnapshot {
    /// Build from a single video document
    pub fn from_document(parts: PartSet, document: Map<String, Value>) -> Self {
        let id = document
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            id,
            parts,
            document,
        }
    }

    /// Build from a `videos.list` response; zero items is [`GatewayError::NotFound`]
    pub fn from_list_response(
        id: &str,
        parts: PartSet,
        response: Value,
    ) -> Result<Self, GatewayError> {
        let list: VideoListResponse = serde_json::from_value(response)?;
        let Some(document) = list.items.into_iter().next() else {
            return Err(GatewayError::NotFound { id: id.to_string() });
        };
        let mut snapshot = Self::from_document(parts, document);
        if snapshot.id.is_empty() {
            snapshot.id = id.to_string();
        }
        Ok(snapshot)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parts that were requested when this snapshot was taken
    pub fn parts(&self) -> &PartSet {
        &self.parts
    }

    pub fn part(&self, part: Part) -> Option<&Value> {
        self.document.get(part.api_name()).filter(|v| !v.is_null())
    }

    pub fn part_mut(&mut self, part: Part) -> Option<&mut Value> {
        self.document.get_mut(part.api_name()).filter(|v| !v.is_null())
    }

    /// A string field inside a sub-document
    pub fn part_field(&self, part: Part, field: &str) -> Option<&str> {
        self.part(part)?.get(field)?.as_str()
    }

    /// Canonical string form of a sub-document; absent parts encode as ""
    pub fn encode_part(&self, part: Part) -> String {
        self.part(part).map(encode_document).unwrap_or_default()
    }

    /// Canonical string form of the whole video document
    pub fn encode(&self) -> String {
        encode_document(&Value::Object(self.document.clone()))
    }

    /// Body for `videos.update`: the id plus every listed part, whole.
    /// A listed part missing from the snapshot is an error; it is never synthesized.
    pub fn update_body(&self, parts: &PartSet) -> Result<Value, GatewayError> {
        let mut body = Map::new();
        body.insert("id".to_string(), Value::String(self.id.clone()));
        for part in parts.iter().filter(|p| *p != Part::Id) {
            let Some(document) = self.part(part) else {
                return Err(GatewayError::InvalidRequest(format!(
                    "snapshot of video {} has no {} part to update",
                    self.id, part
                )));
            };
            body.insert(part.api_name().to_string(), document.clone());
        }
        Ok(Value::Object(body))
    }
}

/// Compact JSON with object keys sorted at every level, so equal documents
/// always encode to equal strings whatever order `serde_json::Map` keeps.
pub fn encode_document(value: &Value) -> String {
    sorted_keys(value).to_string()
}

fn sorted_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sorted_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}

/// Fetch/apply contract against the remote video collection
///
/// Implementations are shared by every in-flight operation of a session and
/// must be safe for concurrent use.
#[async_trait]
pub trait VideoGateway: Send + Sync {
    /// Fetch one video. Zero items comes back as [`GatewayError::NotFound`].
    async fn fetch_by_id(&self, id: &str, parts: &PartSet) -> Result<RemoteSnapshot, GatewayError>;

    /// Write back the listed parts of a snapshot obtained from [`fetch_by_id`].
    ///
    /// [`fetch_by_id`]: VideoGateway::fetch_by_id
    async fn apply_partial_update(
        &self,
        parts: &PartSet,
        snapshot: &RemoteSnapshot,
    ) -> Result<RemoteSnapshot, GatewayError>;
}

/// Precondition checks shared by gateway implementations
pub fn check_fetch(id: &str, parts: &PartSet) -> Result<(), GatewayError> {
    if id.is_empty() {
        return Err(GatewayError::InvalidRequest("video id must not be empty".into()));
    }
    if parts.is_empty() {
        return Err(GatewayError::InvalidRequest("at least one part must be requested".into()));
    }
    Ok(())
}

pub fn check_update(parts: &PartSet, snapshot: &RemoteSnapshot) -> Result<(), GatewayError> {
    if parts.is_empty() {
        return Err(GatewayError::InvalidRequest("at least one part must be updated".into()));
    }
    if snapshot.id().is_empty() {
        return Err(GatewayError::InvalidRequest("snapshot has no video id".into()));
    }
    Ok(())
}

#[async_trait]
impl VideoGateway for YoutubeClient {
    async fn fetch_by_id(&self, id: &str, parts: &PartSet) -> Result<RemoteSnapshot, GatewayError> {
        check_fetch(id, parts)?;
        let response = self.list_videos(id, &parts.to_query()).await?;
        RemoteSnapshot::from_list_response(id, parts.clone(), response)
    }

    async fn apply_partial_update(
        &self,
        parts: &PartSet,
        snapshot: &RemoteSnapshot,
    ) -> Result<RemoteSnapshot, GatewayError> {
        check_update(parts, snapshot)?;
        let body = snapshot.update_body(parts)?;
        let response = self.update_video(&parts.to_query(), &body).await?;
        let document = match response {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => serde_json::from_value(other)?,
        };
        Ok(RemoteSnapshot::from_document(parts.clone(), document))
    }
}
