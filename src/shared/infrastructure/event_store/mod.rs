// Event store over a key-value state store.
//
// Responsibilities
// - Append: read the head with its ETag, run the concurrency guard, stamp versions,
//   refuse duplicate slices, then hand the write to the configured slice mode.
// - Load: read the head and let the slice mode produce the events lazily.
//
// Boundaries
// - No locking here. Every race is settled by the store's conditional writes.
// - Retrying after a conflict is up to the caller.

use crate::shared::core::concurrency::Concurrency;
use crate::shared::core::errors::EventStoreError;
use crate::shared::core::event_data::EventData;
use crate::shared::core::naming;
use crate::shared::core::stream_head::StreamHead;
use crate::shared::infrastructure::state_store::StateStore;
use futures_util::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

pub mod config;
pub mod slice_mode;

use config::EventStoreConfig;
use slice_mode::{EventStream, PersistRequest, SliceMode, StoreContext};

pub struct EventStore<S: StateStore + 'static> {
    client: Arc<S>,
    config: EventStoreConfig,
}

impl<S: StateStore + 'static> Clone for EventStore<S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
        }
    }
}

impl<S: StateStore + 'static> EventStore<S> {
    pub fn new(client: Arc<S>, config: EventStoreConfig) -> Self {
        Self { client, config }
    }

    pub fn mode(&self) -> SliceMode {
        self.config.mode
    }

    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    fn context(&self, stream_name: &str) -> Result<StoreContext<S>, EventStoreError> {
        Ok(StoreContext {
            client: Arc::clone(&self.client),
            store_name: self.config.store_name.clone(),
            stream_name: stream_name.to_string(),
            head_key: naming::stream_head_key(stream_name)?,
            metadata: self.config.metadata_for(stream_name),
            read_page_size: self.config.read_page_size(),
        })
    }

    /// Append with an optimistic lock on `expected_version`.
    pub async fn append_to_stream_expecting(
        &self,
        stream_name: &str,
        expected_version: u64,
        events: &[EventData],
    ) -> Result<u64, EventStoreError> {
        self.append_with_guard(stream_name, &Concurrency::Match(expected_version), events)
            .await
    }

    /// Blind append at whatever the head currently is.
    pub async fn append_to_stream(
        &self,
        stream_name: &str,
        events: &[EventData],
    ) -> Result<u64, EventStoreError> {
        self.append_with_guard(stream_name, &Concurrency::Ignore, events)
            .await
    }

    pub async fn append_with_guard(
        &self,
        stream_name: &str,
        guard: &Concurrency,
        events: &[EventData],
    ) -> Result<u64, EventStoreError> {
        let ctx = self.context(stream_name)?;
        let (value, head_etag) = ctx
            .client
            .get_state_and_etag(&ctx.store_name, &ctx.head_key, &ctx.metadata)
            .await?;
        let head = match value {
            Some(value) => slice_mode::decode::<StreamHead>(&ctx.head_key, value)?,
            None => StreamHead::EMPTY,
        };

        if events.is_empty() {
            return Ok(head.version);
        }

        if let Err(error) = guard.check(stream_name, &head) {
            tracing::warn!(stream = stream_name, %error, "append rejected by concurrency guard");
            return Err(error);
        }

        let new_head = head.advanced_by(events.len());
        let versioned: Vec<EventData> = events
            .iter()
            .enumerate()
            .map(|(i, event)| event.versioned(stream_name, head.version + i as u64 + 1))
            .collect();

        let slice_key = naming::stream_key(stream_name, new_head.version)?;
        let (slice, slice_etag) = ctx
            .client
            .get_state_and_etag(&ctx.store_name, &slice_key, &ctx.metadata)
            .await?;
        if slice.is_some() {
            tracing::warn!(stream = stream_name, %slice_key, "duplicate append detected");
            return Err(EventStoreError::DuplicateAppend {
                key: slice_key,
                version: new_head.version,
            });
        }

        let request = PersistRequest {
            head: new_head,
            head_etag,
            events: versioned,
            slice_key,
            slice_etag,
        };
        if let Err(error) = self.config.mode.persist(&ctx, request).await {
            tracing::warn!(stream = stream_name, mode = %self.config.mode, %error, "append failed");
            return Err(error);
        }

        tracing::debug!(
            stream = stream_name,
            mode = %self.config.mode,
            from = head.version,
            to = new_head.version,
            "appended events"
        );
        Ok(new_head.version)
    }

    /// The head record, or `None` when the stream has never been written.
    pub async fn stream_head(&self, stream_name: &str) -> Result<Option<StreamHead>, EventStoreError> {
        let ctx = self.context(stream_name)?;
        read_head(&ctx).await
    }

    /// Events from `from_version` (inclusive) up to the head, in version order.
    ///
    /// Nothing is read until the stream is polled, and dropping it stops further reads.
    /// An unknown stream yields nothing.
    pub fn load_event_stream(&self, stream_name: &str, from_version: u64) -> EventStream {
        let ctx = match self.context(stream_name) {
            Ok(ctx) => ctx,
            Err(error) => return stream::once(async move { Err(error) }).boxed(),
        };
        let mode = self.config.mode;
        stream::once(async move {
            let head = read_head(&ctx).await?;
            let events = match head {
                Some(head) => {
                    tracing::debug!(
                        stream = %ctx.stream_name,
                        %mode,
                        from_version,
                        head = head.version,
                        "loading events"
                    );
                    mode.read(ctx, head, from_version)
                }
                None => stream::empty().boxed(),
            };
            Ok::<_, EventStoreError>(events)
        })
        .try_flatten()
        .boxed()
    }
}

async fn read_head<S: StateStore>(
    ctx: &StoreContext<S>,
) -> Result<Option<StreamHead>, EventStoreError> {
    let (value, _) = ctx
        .client
        .get_state_and_etag(&ctx.store_name, &ctx.head_key, &ctx.metadata)
        .await?;
    value
        .map(|value| slice_mode::decode(&ctx.head_key, value))
        .transpose()
}
