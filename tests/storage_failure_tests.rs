// A store call can fail after the write it carried was committed. The event store must
// not undo work whose outcome it cannot see.

mod fixtures;

use async_trait::async_trait;
use event_slices::shared::core::errors::EventStoreError;
use event_slices::shared::core::event_data::EventData;
use event_slices::shared::core::stream_head::StreamHead;
use event_slices::shared::infrastructure::event_store::EventStore;
use event_slices::shared::infrastructure::event_store::config::EventStoreConfig;
use event_slices::shared::infrastructure::event_store::slice_mode::SliceMode;
use event_slices::shared::infrastructure::state_store::in_memory::InMemoryStateStore;
use event_slices::shared::infrastructure::state_store::{
    BulkStateItem, ETag, Expected, Metadata, QueryResponse, StateOperation, StateQuery,
    StateStore, StateStoreError,
};
use fixtures::{STORE_NAME, make_customer_events, make_customer_events_from};
use futures_util::TryStreamExt;
use rstest::rstest;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const STREAM: &str = "customer";

/// Commits head writes, then reports a timeout once armed.
struct TimeoutAfterHeadCommit {
    inner: InMemoryStateStore,
    armed: AtomicBool,
}

impl TimeoutAfterHeadCommit {
    fn new() -> Self {
        Self {
            inner: InMemoryStateStore::new(),
            armed: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateStore for TimeoutAfterHeadCommit {
    async fn get_state_and_etag(
        &self,
        store_name: &str,
        key: &str,
        metadata: &Metadata,
    ) -> Result<(Option<Value>, Option<ETag>), StateStoreError> {
        self.inner.get_state_and_etag(store_name, key, metadata).await
    }

    async fn get_bulk_state(
        &self,
        store_name: &str,
        keys: &[String],
        metadata: &Metadata,
    ) -> Result<Vec<BulkStateItem>, StateStoreError> {
        self.inner.get_bulk_state(store_name, keys, metadata).await
    }

    async fn save_state(
        &self,
        store_name: &str,
        key: &str,
        value: Value,
        expected: Expected,
        metadata: &Metadata,
    ) -> Result<ETag, StateStoreError> {
        let etag = self
            .inner
            .save_state(store_name, key, value, expected, metadata)
            .await?;
        if key.ends_with("|head") && self.armed.swap(false, Ordering::SeqCst) {
            return Err(StateStoreError::Unavailable("timeout".into()));
        }
        Ok(etag)
    }

    async fn delete_state(
        &self,
        store_name: &str,
        key: &str,
        expected: Expected,
        metadata: &Metadata,
    ) -> Result<(), StateStoreError> {
        self.inner.delete_state(store_name, key, expected, metadata).await
    }

    async fn execute_transaction(
        &self,
        store_name: &str,
        operations: Vec<StateOperation>,
        metadata: &Metadata,
    ) -> Result<(), StateStoreError> {
        self.inner
            .execute_transaction(store_name, operations, metadata)
            .await
    }

    async fn query_state(
        &self,
        store_name: &str,
        query: &StateQuery,
        metadata: &Metadata,
    ) -> Result<QueryResponse, StateStoreError> {
        self.inner.query_state(store_name, query, metadata).await
    }
}

#[rstest]
#[tokio::test]
async fn it_should_keep_the_slice_when_the_head_write_times_out_after_committing() {
    let state = Arc::new(TimeoutAfterHeadCommit::new());
    let store = EventStore::new(
        Arc::clone(&state),
        EventStoreConfig::default().with_mode(SliceMode::TwoPhased),
    );
    store
        .append_to_stream(STREAM, &make_customer_events(2))
        .await
        .unwrap();

    state.arm();
    let result = store
        .append_to_stream(STREAM, &make_customer_events_from(2, 1))
        .await;
    assert!(
        matches!(result, Err(EventStoreError::StorageUnavailable(_))),
        "unexpected result: {result:?}"
    );

    assert_eq!(store.stream_head(STREAM).await.unwrap(), Some(StreamHead::new(3)));
    assert_eq!(
        state.inner.keys(STORE_NAME).await,
        vec![
            format!("{STREAM}|2"),
            format!("{STREAM}|3"),
            format!("{STREAM}|head")
        ]
    );
    let loaded: Vec<EventData> = store.load_event_stream(STREAM, 1).try_collect().await.unwrap();
    let versions: Vec<u64> = loaded.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}
