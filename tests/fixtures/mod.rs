// Shared fixtures for the integration suites.

use event_slices::shared::core::event_data::EventData;
use event_slices::shared::infrastructure::event_store::EventStore;
use event_slices::shared::infrastructure::event_store::config::EventStoreConfig;
use event_slices::shared::infrastructure::event_store::slice_mode::SliceMode;
use event_slices::shared::infrastructure::state_store::in_memory::InMemoryStateStore;
use serde_json::json;
use std::sync::Arc;

pub const STORE_NAME: &str = "statestore";

#[allow(dead_code)]
pub fn make_customer_events(count: usize) -> Vec<EventData> {
    make_customer_events_from(0, count)
}

#[allow(dead_code)]
pub fn make_customer_events_from(start: usize, count: usize) -> Vec<EventData> {
    (start..start + count)
        .map(|i| {
            EventData::create(
                "CREATE-CUSTOMER",
                json!({"firstName": format!("Jovan{i}"), "lastName": format!("Trajkov{i}"), "random": i}),
            )
        })
        .collect()
}

#[allow(dead_code)]
pub fn make_store(
    mode: SliceMode,
    read_page_size: usize,
) -> (Arc<InMemoryStateStore>, EventStore<InMemoryStateStore>) {
    let state = Arc::new(InMemoryStateStore::new());
    let config = EventStoreConfig::default()
        .with_mode(mode)
        .with_read_page_size(read_page_size);
    (state.clone(), EventStore::new(state, config))
}
