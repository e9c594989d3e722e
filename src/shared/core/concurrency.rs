use crate::shared::core::errors::{Conflict, EventStoreError};
use crate::shared::core::stream_head::StreamHead;

/// Guard evaluated against the freshly read head before any version is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// Optimistic lock: the head must be exactly at this version.
    Match(u64),
    /// Blind append.
    Ignore,
}

impl Concurrency {
    pub fn check(&self, stream_name: &str, head: &StreamHead) -> Result<(), EventStoreError> {
        match *self {
            Concurrency::Match(expected) if head.version != expected => {
                Err(EventStoreError::ConcurrencyConflict {
                    stream: stream_name.to_string(),
                    conflict: Conflict::VersionMismatch {
                        expected,
                        actual: head.version,
                    },
                })
            }
            _ => Ok(()),
        }
    }
}
