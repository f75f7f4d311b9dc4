use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RunId;

/// Kind of a progress event. Serialized names are the SSE event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Progress,
    Error,
    Done,
    Stop,
    Heartbeat,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Progress => "progress",
            EventKind::Error => "error",
            EventKind::Done => "done",
            EventKind::Stop => "stop",
            EventKind::Heartbeat => "heartbeat",
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "start" => EventKind::Start,
            "progress" => EventKind::Progress,
            "error" => EventKind::Error,
            "done" => EventKind::Done,
            "stop" => EventKind::Stop,
            "heartbeat" => EventKind::Heartbeat,
            other => anyhow::bail!("unknown event kind: {other}"),
        })
    }
}

/// Append-only log entry describing one step of a run. Immutable once
/// created; ordering within a run is creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub run_id: RunId,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(run_id: RunId, kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            run_id,
            kind,
            message: Some(message.into()),
            payload: None,
            created_at: Utc::now(),
        }
    }

    pub fn heartbeat(run_id: RunId) -> Self {
        Self {
            run_id,
            kind: EventKind::Heartbeat,
            message: None,
            payload: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Where the pipeline sends its progress events.
///
/// The run manager's sink appends each event to storage and broadcasts it to
/// live observers; tests substitute an in-memory recorder.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: ProgressEvent);
}
