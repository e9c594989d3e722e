// Physical layouts a stream can be persisted in.
//
// Every mode offers the same two operations:
// - persist: write the advanced head and the versioned events of one append.
// - read: produce the events of [from_version, head.version] in version order.
//
// The mode is picked once, when the event store is built.

use crate::shared::core::errors::EventStoreError;
use crate::shared::core::event_data::EventData;
use crate::shared::core::stream_head::StreamHead;
use crate::shared::infrastructure::state_store::{
    ETag, Expected, Metadata, StateOperation, StateStore, StateStoreError,
};
use futures_util::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

mod off;
mod off_and_shared_all;
mod slices;
mod transactional;
mod two_phased;

pub type EventStream = BoxStream<'static, Result<EventData, EventStoreError>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SliceMode {
    /// One key per event, written with the head in one transaction.
    #[default]
    Off,
    /// One key per event addressed by event id; reads go through a store query.
    OffAndSharedAll,
    /// Slice written first, head advanced in a second conditional write.
    TwoPhased,
    /// One slice key per append, written with the head in one transaction.
    Transactional,
}

/// Everything a mode needs to talk to the store on behalf of one stream.
pub struct StoreContext<S> {
    pub client: Arc<S>,
    pub store_name: String,
    pub stream_name: String,
    pub head_key: String,
    pub metadata: Metadata,
    pub read_page_size: usize,
}

impl<S> Clone for StoreContext<S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store_name: self.store_name.clone(),
            stream_name: self.stream_name.clone(),
            head_key: self.head_key.clone(),
            metadata: self.metadata.clone(),
            read_page_size: self.read_page_size,
        }
    }
}

impl<S> StoreContext<S> {
    fn write_error(&self, error: StateStoreError, version: u64) -> EventStoreError {
        EventStoreError::from_write(error, &self.stream_name, &self.head_key, version)
    }
}

#[derive(Debug, Clone)]
pub struct PersistRequest {
    /// The head as it will read after the append.
    pub head: StreamHead,
    pub head_etag: Option<ETag>,
    pub events: Vec<EventData>,
    pub slice_key: String,
    pub slice_etag: Option<ETag>,
}

impl PersistRequest {
    fn head_operation(&self, head_key: &str) -> Result<StateOperation, EventStoreError> {
        Ok(StateOperation::Upsert {
            key: head_key.to_string(),
            value: serde_json::to_value(self.head)?,
            expected: Expected::from_token(self.head_etag.clone()),
        })
    }
}

impl SliceMode {
    pub const ALL: [SliceMode; 4] = [
        SliceMode::Off,
        SliceMode::OffAndSharedAll,
        SliceMode::TwoPhased,
        SliceMode::Transactional,
    ];

    pub fn code(self) -> i64 {
        match self {
            SliceMode::Off => 0,
            SliceMode::OffAndSharedAll => 5,
            SliceMode::TwoPhased => 10,
            SliceMode::Transactional => 20,
        }
    }

    pub async fn persist<S>(
        self,
        ctx: &StoreContext<S>,
        request: PersistRequest,
    ) -> Result<(), EventStoreError>
    where
        S: StateStore + 'static,
    {
        match self {
            SliceMode::Off => off::persist(ctx, request).await,
            SliceMode::OffAndSharedAll => off_and_shared_all::persist(ctx, request).await,
            SliceMode::TwoPhased => two_phased::persist(ctx, request).await,
            SliceMode::Transactional => transactional::persist(ctx, request).await,
        }
    }

    pub fn read<S>(self, ctx: StoreContext<S>, head: StreamHead, from_version: u64) -> EventStream
    where
        S: StateStore + 'static,
    {
        match self {
            SliceMode::Off => off::read(ctx, head, from_version),
            SliceMode::OffAndSharedAll => off_and_shared_all::read(ctx, head, from_version),
            SliceMode::TwoPhased | SliceMode::Transactional => {
                slices::read(ctx, head, from_version)
            }
        }
    }
}

impl fmt::Display for SliceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SliceMode::Off => "Off",
            SliceMode::OffAndSharedAll => "OffAndSharedAll",
            SliceMode::TwoPhased => "TwoPhased",
            SliceMode::Transactional => "Transactional",
        };
        f.write_str(name)
    }
}

impl TryFrom<i64> for SliceMode {
    type Error = EventStoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        SliceMode::ALL
            .into_iter()
            .find(|mode| mode.code() == code)
            .ok_or_else(|| EventStoreError::UnsupportedMode(code.to_string()))
    }
}

impl FromStr for SliceMode {
    type Err = EventStoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = value.trim().parse::<i64>() {
            return SliceMode::try_from(code);
        }
        let normalized: String = value
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "off" => Ok(SliceMode::Off),
            "offandsharedall" => Ok(SliceMode::OffAndSharedAll),
            "twophased" => Ok(SliceMode::TwoPhased),
            "transactional" => Ok(SliceMode::Transactional),
            _ => Err(EventStoreError::UnsupportedMode(value.to_string())),
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, EventStoreError> {
    serde_json::from_value(value).map_err(|_| EventStoreError::Corrupted {
        key: key.to_string(),
    })
}
