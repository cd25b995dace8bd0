//! Shared fixtures: a recording in-memory gateway and sample video documents

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ytvideo::provider::{GatewayError, PartSet, RemoteSnapshot, VideoGateway};

/// One call observed by [`FakeGateway`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch { id: String, parts: String },
    Apply { parts: String, body: Value },
}

/// In-memory gateway that records every call
#[derive(Default)]
pub struct FakeGateway {
    videos: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<Call>>,
    fetch_error: Mutex<Option<fn() -> GatewayError>>,
    apply_error: Mutex<Option<fn() -> GatewayError>>,
    fetch_delay: Mutex<Option<Duration>>,
    apply_delay: Mutex<Option<Duration>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_video(video: Value) -> Arc<Self> {
        let gateway = Self::new();
        gateway.put(video);
        gateway
    }

    pub fn put(&self, video: Value) {
        let id = video["id"].as_str().unwrap().to_string();
        self.videos.lock().unwrap().insert(id, video);
    }

    pub fn fail_fetch(&self, make: fn() -> GatewayError) {
        *self.fetch_error.lock().unwrap() = Some(make);
    }

    pub fn fail_apply(&self, make: fn() -> GatewayError) {
        *self.apply_error.lock().unwrap() = Some(make);
    }

    pub fn delay_fetch(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn delay_apply(&self, delay: Duration) {
        *self.apply_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn apply_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Apply { .. }))
            .collect()
    }
}

#[async_trait]
impl VideoGateway for FakeGateway {
    async fn fetch_by_id(&self, id: &str, parts: &PartSet) -> Result<RemoteSnapshot, GatewayError> {
        self.calls.lock().unwrap().push(Call::Fetch {
            id: id.to_string(),
            parts: parts.to_query(),
        });
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = *self.fetch_error.lock().unwrap();
        if let Some(make) = failure {
            return Err(make());
        }
        let items: Vec<Value> = self.videos.lock().unwrap().get(id).cloned().into_iter().collect();
        RemoteSnapshot::from_list_response(id, parts.clone(), json!({ "items": items }))
    }

    async fn apply_partial_update(
        &self,
        parts: &PartSet,
        snapshot: &RemoteSnapshot,
    ) -> Result<RemoteSnapshot, GatewayError> {
        let body = snapshot.update_body(parts)?;
        self.calls.lock().unwrap().push(Call::Apply {
            parts: parts.to_query(),
            body: body.clone(),
        });
        let delay = *self.apply_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = *self.apply_error.lock().unwrap();
        if let Some(make) = failure {
            return Err(make());
        }
        let Value::Object(document) = body else {
            unreachable!("update body is always an object");
        };
        let mut stored = self.videos.lock().unwrap();
        if let Some(Value::Object(video)) = stored.get_mut(snapshot.id()) {
            for (key, value) in &document {
                video.insert(key.clone(), value.clone());
            }
        }
        Ok(RemoteSnapshot::from_document(parts.clone(), document))
    }
}

/// A video as `videos.list` returns it with every readable part
pub fn sample_video(id: &str) -> Value {
    json!({
        "kind": "youtube#video",
        "etag": "etag-1",
        "id": id,
        "snippet": {
            "publishedAt": "2024-01-15T10:30:00Z",
            "channelId": "UC123",
            "title": "Old Title",
            "description": "Old Desc",
            "categoryId": "22",
            "tags": ["rust", "video"]
        },
        "contentDetails": {"duration": "PT4M13S", "definition": "hd", "caption": "false"},
        "status": {"uploadStatus": "processed", "privacyStatus": "public"},
        "statistics": {"viewCount": "1024", "likeCount": "12", "commentCount": "3"},
        "player": {"embedHtml": "<iframe src=\"//www.youtube.com/embed/x\"></iframe>"},
        "topicDetails": {"topicCategories": ["https://en.wikipedia.org/wiki/Music"]},
        "recordingDetails": {},
        "localizations": {"fr": {"title": "Ancien titre", "description": "Ancienne desc"}}
    })
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}
