use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An event as stored in a stream. `version` is 0 until the event store stamps it on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub event_id: String,
    pub event_name: String,
    pub stream_name: String,
    pub data: Value,
    #[serde(default)]
    pub version: u64,
}

impl EventData {
    pub fn create(event_name: impl Into<String>, data: Value) -> Self {
        Self::for_stream(event_name, "unknown", data)
    }

    pub fn for_stream(
        event_name: impl Into<String>,
        stream_name: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7().to_string(),
            event_name: event_name.into(),
            stream_name: stream_name.into(),
            data,
            version: 0,
        }
    }

    pub fn versioned(&self, stream_name: &str, version: u64) -> Self {
        Self {
            event_id: self.event_id.clone(),
            event_name: self.event_name.clone(),
            stream_name: stream_name.to_string(),
            data: self.data.clone(),
            version,
        }
    }
}
