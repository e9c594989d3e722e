use crate::shared::infrastructure::event_store::EventStore;
use crate::shared::infrastructure::event_store::config::EventStoreConfig;
use crate::shared::infrastructure::state_store::in_memory::InMemoryStateStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub event_store: Arc<EventStore<InMemoryStateStore>>,
}

impl AppState {
    pub fn in_memory(config: EventStoreConfig) -> Self {
        let state_store = Arc::new(InMemoryStateStore::new());
        Self {
            event_store: Arc::new(EventStore::new(state_store, config)),
        }
    }
}
