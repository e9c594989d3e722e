use crate::shared::infrastructure::event_store::slice_mode::SliceMode;
use crate::shared::infrastructure::state_store::Metadata;
use std::fmt;
use std::sync::Arc;

/// Produces the store metadata attached to every call made for a stream.
pub type MetadataProvider = Arc<dyn Fn(&str) -> Metadata + Send + Sync>;

pub const DEFAULT_STORE_NAME: &str = "statestore";
pub const DEFAULT_READ_PAGE_SIZE: usize = 100;
pub const MAX_READ_PAGE_SIZE: usize = 10_000;

#[derive(Clone)]
pub struct EventStoreConfig {
    pub store_name: String,
    pub mode: SliceMode,
    pub metadata_provider: MetadataProvider,
    read_page_size: usize,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            mode: SliceMode::Off,
            metadata_provider: Arc::new(|_| Metadata::new()),
            read_page_size: DEFAULT_READ_PAGE_SIZE,
        }
    }
}

impl EventStoreConfig {
    pub fn with_store_name(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = store_name.into();
        self
    }

    pub fn with_mode(mut self, mode: SliceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_metadata_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&str) -> Metadata + Send + Sync + 'static,
    {
        self.metadata_provider = Arc::new(provider);
        self
    }

    /// Clamped to `1..=MAX_READ_PAGE_SIZE`.
    pub fn with_read_page_size(mut self, read_page_size: usize) -> Self {
        self.read_page_size = read_page_size.clamp(1, MAX_READ_PAGE_SIZE);
        self
    }

    pub fn read_page_size(&self) -> usize {
        self.read_page_size
    }

    pub fn metadata_for(&self, stream_name: &str) -> Metadata {
        (self.metadata_provider)(stream_name)
    }
}

impl fmt::Debug for EventStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStoreConfig")
            .field("store_name", &self.store_name)
            .field("mode", &self.mode)
            .field("read_page_size", &self.read_page_size)
            .finish_non_exhaustive()
    }
}
