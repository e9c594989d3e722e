// Settings read from the environment (a `.env` file is honoured).
//
// EVENT_STORE_NAME                 state store component name, default "statestore"
// EVENT_STORE_SLICE_MODE           off | off-and-shared-all | two-phased | transactional (or 0/5/10/20)
// EVENT_STORE_READ_PAGE_SIZE       keys or records fetched per read round trip, 1..=10000
// EVENT_STORE_PARTITION_BY_STREAM  when true, every call carries partitionKey=<stream>
// BIND_ADDR                        default 0.0.0.0:8080

use anyhow::Context;
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::shared::infrastructure::event_store::config::{
    DEFAULT_READ_PAGE_SIZE, DEFAULT_STORE_NAME, EventStoreConfig, MAX_READ_PAGE_SIZE,
};
use crate::shared::infrastructure::event_store::slice_mode::SliceMode;
use crate::shared::infrastructure::state_store::Metadata;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_name: String,
    pub mode: SliceMode,
    pub read_page_size: usize,
    pub partition_by_stream: bool,
    pub bind_addr: SocketAddr,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> anyhow::Result<Self> {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let mode = match get("EVENT_STORE_SLICE_MODE") {
            Some(value) => value
                .parse::<SliceMode>()
                .with_context(|| format!("EVENT_STORE_SLICE_MODE={value}"))?,
            None => SliceMode::default(),
        };
        let read_page_size = match get("EVENT_STORE_READ_PAGE_SIZE") {
            Some(value) => {
                let size = value
                    .parse::<usize>()
                    .with_context(|| format!("EVENT_STORE_READ_PAGE_SIZE={value}"))?;
                if !(1..=MAX_READ_PAGE_SIZE).contains(&size) {
                    anyhow::bail!(
                        "EVENT_STORE_READ_PAGE_SIZE={value}: must be between 1 and {MAX_READ_PAGE_SIZE}"
                    );
                }
                size
            }
            None => DEFAULT_READ_PAGE_SIZE,
        };
        let partition_by_stream = match get("EVENT_STORE_PARTITION_BY_STREAM") {
            Some(value) => value
                .parse::<bool>()
                .with_context(|| format!("EVENT_STORE_PARTITION_BY_STREAM={value}"))?,
            None => false,
        };
        let bind_addr = get("BIND_ADDR")
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .context("BIND_ADDR")?;

        Ok(Self {
            store_name: get("EVENT_STORE_NAME")
                .unwrap_or(DEFAULT_STORE_NAME)
                .to_string(),
            mode,
            read_page_size,
            partition_by_stream,
            bind_addr,
        })
    }

    pub fn event_store_config(&self) -> EventStoreConfig {
        let config = EventStoreConfig::default()
            .with_store_name(self.store_name.clone())
            .with_mode(self.mode)
            .with_read_page_size(self.read_page_size);
        if self.partition_by_stream {
            config.with_metadata_provider(|stream| {
                Metadata::from([("partitionKey".to_string(), stream.to_string())])
            })
        } else {
            config
        }
    }
}
