// In memory implementation of the StateStore port.
//
// Purpose
// - Support event store tests and local development without a state store sidecar.
//
// Responsibilities
// - Keep values per (store name, key) with a fresh ETag on every write.
// - Enforce write preconditions and run transactions all-or-nothing.
// - Answer attribute queries with sorting and offset paging.

use crate::shared::infrastructure::state_store::{
    BulkStateItem, ETag, Expected, Metadata, QueryFilter, QueryItem, QueryResponse, QuerySort,
    SortOrder, StateOperation, StateQuery, StateStore, StateStoreError,
};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    etag: ETag,
}

type Entries = HashMap<(String, String), Entry>;

pub struct InMemoryStateStore {
    inner: RwLock<Entries>,
    etag_counter: AtomicU64,
    delay_ms: AtomicU64,
    offline: bool,
    last_metadata: Mutex<Option<Metadata>>,
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            etag_counter: AtomicU64::new(0),
            delay_ms: AtomicU64::new(0),
            offline: false,
            last_metadata: Mutex::new(None),
        }
    }

    pub fn toggle_offline(&mut self) {
        self.offline = !self.offline;
    }

    /// Sleep before every operation, so concurrent callers interleave.
    pub fn set_delay_ms(&self, ms: u64) {
        self.delay_ms.store(ms, AtomicOrdering::SeqCst);
    }

    pub async fn last_metadata(&self) -> Option<Metadata> {
        self.last_metadata.lock().await.clone()
    }

    /// Keys held for `store_name`, sorted.
    pub async fn keys(&self, store_name: &str) -> Vec<String> {
        let guard = self.inner.read().await;
        let mut keys: Vec<String> = guard
            .keys()
            .filter(|(store, _)| store == store_name)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    async fn enter(&self, metadata: &Metadata) -> Result<(), StateStoreError> {
        let delay = self.delay_ms.load(AtomicOrdering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        *self.last_metadata.lock().await = Some(metadata.clone());
        if self.offline {
            return Err(StateStoreError::Unavailable("state store offline".into()));
        }
        Ok(())
    }

    fn next_etag(&self) -> ETag {
        ETag::new((self.etag_counter.fetch_add(1, AtomicOrdering::SeqCst) + 1).to_string())
    }
}

fn check_expected(
    key: &str,
    current: Option<&Entry>,
    expected: &Expected,
) -> Result<(), StateStoreError> {
    let satisfied = match (expected, current) {
        (Expected::Any, _) => true,
        (Expected::Absent, current) => current.is_none(),
        (Expected::ETag(etag), Some(entry)) => entry.etag == *etag,
        (Expected::ETag(_), None) => false,
    };
    if satisfied {
        Ok(())
    } else {
        Err(StateStoreError::ETagMismatch { key: key.to_string() })
    }
}

fn field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| current.get(segment))
}

fn matches(value: &Value, filter: &QueryFilter) -> bool {
    match filter {
        QueryFilter::Eq { field: path, value: wanted } => field(value, path) == Some(wanted),
        QueryFilter::In { field: path, values } => field(value, path)
            .map(|found| values.contains(found))
            .unwrap_or(false),
        QueryFilter::Gte { field: path, value: bound } => {
            comparable(field(value, path), bound).is_some_and(|o| o != Ordering::Less)
        }
        QueryFilter::Lte { field: path, value: bound } => {
            comparable(field(value, path), bound).is_some_and(|o| o != Ordering::Greater)
        }
        QueryFilter::And(filters) => filters.iter().all(|f| matches(value, f)),
        QueryFilter::Or(filters) => filters.iter().any(|f| matches(value, f)),
    }
}

fn comparable(found: Option<&Value>, bound: &Value) -> Option<Ordering> {
    match (found?, bound) {
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
            Some(compare(found, Some(bound)))
        }
        _ => None,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_u64(), y.as_u64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn sort_items(items: &mut [QueryItem], sort: &[QuerySort]) {
    items.sort_by(|a, b| {
        sort.iter()
            .map(|s| {
                let ordering = compare(field(&a.value, &s.field), field(&b.value, &s.field));
                match s.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| a.key.cmp(&b.key))
    });
}

#[async_trait::async_trait]
impl StateStore for InMemoryStateStore {
    async fn get_state_and_etag(
        &self,
        store_name: &str,
        key: &str,
        metadata: &Metadata,
    ) -> Result<(Option<Value>, Option<ETag>), StateStoreError> {
        self.enter(metadata).await?;
        let guard = self.inner.read().await;
        Ok(match guard.get(&(store_name.to_string(), key.to_string())) {
            Some(entry) => (Some(entry.value.clone()), Some(entry.etag.clone())),
            None => (None, None),
        })
    }

    async fn get_bulk_state(
        &self,
        store_name: &str,
        keys: &[String],
        metadata: &Metadata,
    ) -> Result<Vec<BulkStateItem>, StateStoreError> {
        self.enter(metadata).await?;
        let guard = self.inner.read().await;
        Ok(keys
            .iter()
            .map(|key| {
                let entry = guard.get(&(store_name.to_string(), key.clone()));
                BulkStateItem {
                    key: key.clone(),
                    value: entry.map(|e| e.value.clone()),
                    etag: entry.map(|e| e.etag.clone()),
                }
            })
            .collect())
    }

    async fn save_state(
        &self,
        store_name: &str,
        key: &str,
        value: Value,
        expected: Expected,
        metadata: &Metadata,
    ) -> Result<ETag, StateStoreError> {
        self.enter(metadata).await?;
        let mut guard = self.inner.write().await;
        let slot = (store_name.to_string(), key.to_string());
        check_expected(key, guard.get(&slot), &expected)?;
        let etag = self.next_etag();
        guard.insert(
            slot,
            Entry {
                value,
                etag: etag.clone(),
            },
        );
        Ok(etag)
    }

    async fn delete_state(
        &self,
        store_name: &str,
        key: &str,
        expected: Expected,
        metadata: &Metadata,
    ) -> Result<(), StateStoreError> {
        self.enter(metadata).await?;
        let mut guard = self.inner.write().await;
        let slot = (store_name.to_string(), key.to_string());
        check_expected(key, guard.get(&slot), &expected)?;
        guard.remove(&slot);
        Ok(())
    }

    async fn execute_transaction(
        &self,
        store_name: &str,
        operations: Vec<StateOperation>,
        metadata: &Metadata,
    ) -> Result<(), StateStoreError> {
        self.enter(metadata).await?;
        let mut guard = self.inner.write().await;
        for operation in &operations {
            let (key, expected) = match operation {
                StateOperation::Upsert { key, expected, .. }
                | StateOperation::Delete { key, expected } => (key, expected),
            };
            check_expected(
                key,
                guard.get(&(store_name.to_string(), key.clone())),
                expected,
            )?;
        }
        for operation in operations {
            match operation {
                StateOperation::Upsert { key, value, .. } => {
                    let etag = self.next_etag();
                    guard.insert((store_name.to_string(), key), Entry { value, etag });
                }
                StateOperation::Delete { key, .. } => {
                    guard.remove(&(store_name.to_string(), key));
                }
            }
        }
        Ok(())
    }

    async fn query_state(
        &self,
        store_name: &str,
        query: &StateQuery,
        metadata: &Metadata,
    ) -> Result<QueryResponse, StateStoreError> {
        self.enter(metadata).await?;
        let offset = match &query.token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StateStoreError::Unsupported(format!("query token {token}")))?,
            None => 0,
        };
        let guard = self.inner.read().await;
        let mut items: Vec<QueryItem> = guard
            .iter()
            .filter(|((store, _), entry)| store == store_name && matches(&entry.value, &query.filter))
            .map(|((_, key), entry)| QueryItem {
                key: key.clone(),
                value: entry.value.clone(),
                etag: entry.etag.clone(),
            })
            .collect();
        drop(guard);
        sort_items(&mut items, &query.sort);

        let total = items.len();
        let limit = query.limit.unwrap_or(total).max(1);
        let results: Vec<QueryItem> = items.into_iter().skip(offset).take(limit).collect();
        let next = offset + results.len();
        Ok(QueryResponse {
            results,
            token: (next < total).then(|| next.to_string()),
        })
    }
}
