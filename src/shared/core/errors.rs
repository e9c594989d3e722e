use crate::shared::infrastructure::state_store::StateStoreError;
use thiserror::Error;

/// Why an append lost the optimistic-concurrency check.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Conflict {
    #[error("wrong version - expected {expected} but was {actual}")]
    VersionMismatch { expected: u64, actual: u64 },

    #[error("head {key} was updated by another writer")]
    HeadRaced { key: String },
}

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("concurrency conflict on stream {stream}: {conflict}")]
    ConcurrencyConflict { stream: String, conflict: Conflict },

    #[error("event slice {key} ending with event version {version} already exists")]
    DuplicateAppend { key: String, version: u64 },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("unsupported slice mode: {0}")]
    UnsupportedMode(String),

    #[error("invalid stream name {0:?}")]
    InvalidStreamName(String),

    #[error("stored value under {key} is missing or malformed")]
    Corrupted { key: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Translate a failed store call made while writing `stream`, whose head lives under `head_key`.
    pub(crate) fn from_write(
        error: StateStoreError,
        stream: &str,
        head_key: &str,
        version: u64,
    ) -> Self {
        match error {
            StateStoreError::ETagMismatch { key } if key == head_key => {
                EventStoreError::ConcurrencyConflict {
                    stream: stream.to_string(),
                    conflict: Conflict::HeadRaced { key },
                }
            }
            StateStoreError::ETagMismatch { key } => EventStoreError::DuplicateAppend { key, version },
            other => other.into(),
        }
    }

    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }
}

impl From<StateStoreError> for EventStoreError {
    fn from(error: StateStoreError) -> Self {
        match error {
            StateStoreError::Unavailable(reason) => EventStoreError::StorageUnavailable(reason),
            StateStoreError::Unsupported(reason) => EventStoreError::UnsupportedMode(reason),
            StateStoreError::ETagMismatch { key } => EventStoreError::StorageUnavailable(format!(
                "unexpected etag mismatch on read of {key}"
            )),
        }
    }
}
