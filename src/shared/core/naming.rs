// Storage key derivation for streams.
//
// Keys are `<stream>|head` for the head record and `<stream>|<version>` for the slice
// (or single event) ending at that version. Events addressed by id live under
// `<stream>|e|<eventId>`, so no id can land on the head or a version key. The
// separator is not allowed inside a stream name, so keys of different streams never
// collide.

use crate::shared::core::errors::EventStoreError;

pub const SEPARATOR: char = '|';

pub fn validate_stream_name(stream_name: &str) -> Result<(), EventStoreError> {
    if stream_name.trim().is_empty() || stream_name.contains(SEPARATOR) {
        return Err(EventStoreError::InvalidStreamName(stream_name.to_string()));
    }
    Ok(())
}

pub fn stream_head_key(stream_name: &str) -> Result<String, EventStoreError> {
    validate_stream_name(stream_name)?;
    Ok(format!("{stream_name}{SEPARATOR}head"))
}

pub fn stream_key(stream_name: &str, ending_version: u64) -> Result<String, EventStoreError> {
    validate_stream_name(stream_name)?;
    Ok(format!("{stream_name}{SEPARATOR}{ending_version}"))
}

/// Per-event key addressed by event id rather than version, used when reads go through a query.
pub fn shared_event_key(stream_name: &str, event_id: &str) -> Result<String, EventStoreError> {
    validate_stream_name(stream_name)?;
    Ok(format!("{stream_name}{SEPARATOR}e{SEPARATOR}{event_id}"))
}
