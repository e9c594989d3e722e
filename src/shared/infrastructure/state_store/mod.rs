// Port for the external key-value state store the event store is built on.
//
// Purpose
// - Describe the capabilities consumed from the store: versioned reads, conditional
//   single-key writes, multi-key transactions and attribute queries.
//
// Boundaries
// - No storage engine or transport here. Adapters implement the trait.
//
// Testing guidance
// - Use the in memory implementation for tests and local development.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod in_memory;

/// Opaque per-call hints forwarded to the store (partition keys and the like).
pub type Metadata = HashMap<String, String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateStoreError {
    #[error("etag mismatch on key {key}")]
    ETagMismatch { key: String },

    #[error("state store unavailable: {0}")]
    Unavailable(String),

    #[error("operation not supported by state store: {0}")]
    Unsupported(String),
}

/// Optimistic-concurrency token handed out with every read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ETag(String);

impl ETag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Precondition a conditional write is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Any,
    Absent,
    ETag(ETag),
}

impl Expected {
    /// Turn the token observed on a read back into the precondition for writing that key.
    pub fn from_token(token: Option<ETag>) -> Self {
        match token {
            Some(etag) => Expected::ETag(etag),
            None => Expected::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateOperation {
    Upsert {
        key: String,
        value: Value,
        expected: Expected,
    },
    Delete {
        key: String,
        expected: Expected,
    },
}

impl StateOperation {
    pub fn key(&self) -> &str {
        match self {
            StateOperation::Upsert { key, .. } | StateOperation::Delete { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkStateItem {
    pub key: String,
    pub value: Option<Value>,
    pub etag: Option<ETag>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Eq { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    /// Field is present, of the bound's type, and not below it.
    Gte { field: String, value: Value },
    /// Field is present, of the bound's type, and not above it.
    Lte { field: String, value: Value },
    And(Vec<QueryFilter>),
    Or(Vec<QueryFilter>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySort {
    pub field: String,
    pub order: SortOrder,
}

/// Attribute query over stored values. Field names are dotted paths into the value.
#[derive(Debug, Clone, PartialEq)]
pub struct StateQuery {
    pub filter: QueryFilter,
    pub sort: Vec<QuerySort>,
    pub limit: Option<usize>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryItem {
    pub key: String,
    pub value: Value,
    pub etag: ETag,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    pub results: Vec<QueryItem>,
    /// Continuation token, present when more pages remain.
    pub token: Option<String>,
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_state_and_etag(
        &self,
        store_name: &str,
        key: &str,
        metadata: &Metadata,
    ) -> Result<(Option<Value>, Option<ETag>), StateStoreError>;

    /// Results come back in the order of `keys`; absent keys carry no value.
    async fn get_bulk_state(
        &self,
        store_name: &str,
        keys: &[String],
        metadata: &Metadata,
    ) -> Result<Vec<BulkStateItem>, StateStoreError>;

    async fn save_state(
        &self,
        store_name: &str,
        key: &str,
        value: Value,
        expected: Expected,
        metadata: &Metadata,
    ) -> Result<ETag, StateStoreError>;

    async fn delete_state(
        &self,
        store_name: &str,
        key: &str,
        expected: Expected,
        metadata: &Metadata,
    ) -> Result<(), StateStoreError>;

    /// All operations commit together or none do.
    async fn execute_transaction(
        &self,
        store_name: &str,
        operations: Vec<StateOperation>,
        metadata: &Metadata,
    ) -> Result<(), StateStoreError>;

    async fn query_state(
        &self,
        store_name: &str,
        query: &StateQuery,
        metadata: &Metadata,
    ) -> Result<QueryResponse, StateStoreError>;
}
