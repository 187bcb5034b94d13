use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::batch::Write;
use crate::error::{StoreError, StoreResult};
use crate::model::{DocumentKey, FieldPath};
use crate::observer::{PartialObserver, Unsubscribe};
use crate::query::{FieldFilter, FilterOperator, OrderBy, OrderDirection, QueryDefinition};
use crate::shape;
use crate::snapshot::{DocumentSnapshot, SnapshotMetadata, SnapshotOptions};
use crate::value::DocumentData;

use super::Datastore;

/// A datastore that keeps documents in process memory.
///
/// Useful for tests or demos where persistence and network access are not
/// required. Listeners are fanned out synchronously after every mutation.
#[derive(Clone, Default)]
pub struct InMemoryDatastore {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    documents: Mutex<BTreeMap<String, StoredDocument>>,
    document_listeners: Mutex<Vec<DocumentListener>>,
    query_listeners: Mutex<Vec<QueryListener>>,
    next_listener_id: AtomicU64,
}

struct StoredDocument {
    data: DocumentData,
    updated_at: DateTime<Utc>,
}

struct DocumentListener {
    id: u64,
    key: DocumentKey,
    observer: PartialObserver<DocumentSnapshot>,
}

struct QueryListener {
    id: u64,
    definition: QueryDefinition,
    observer: PartialObserver<Vec<DocumentSnapshot>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_set(&self, key: &DocumentKey, data: DocumentData) -> StoreResult<()> {
        let mut store = self.shared.documents.lock().unwrap();
        store.insert(
            key.path().canonical_string(),
            StoredDocument {
                data,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn apply_update(&self, key: &DocumentKey, data: DocumentData) -> StoreResult<()> {
        let mut store = self.shared.documents.lock().unwrap();
        let canonical = key.path().canonical_string();
        let current = store
            .get_mut(&canonical)
            .ok_or_else(|| StoreError::not_found(format!("Document {canonical} does not exist")))?;

        // Dotted keys in an update address nested fields.
        for (field, value) in data {
            if field.contains('.') {
                let path = FieldPath::from_dot_separated(&field)?;
                shape::insert_at(&mut current.data, &path, value);
            } else {
                current.data.insert(field, value);
            }
        }
        current.updated_at = Utc::now();
        Ok(())
    }

    fn apply_delete(&self, key: &DocumentKey) -> StoreResult<()> {
        let mut store = self.shared.documents.lock().unwrap();
        store.remove(&key.path().canonical_string());
        Ok(())
    }

    fn snapshot_for(&self, key: &DocumentKey) -> DocumentSnapshot {
        let store = self.shared.documents.lock().unwrap();
        build_snapshot(&store, key)
    }

    fn next_listener_id(&self) -> u64 {
        self.shared
            .next_listener_id
            .fetch_add(1, AtomicOrdering::SeqCst)
    }

    /// Delivers fresh snapshots to every listener affected by the mutated keys.
    fn notify(&self, affected: &[DocumentKey]) {
        if affected.is_empty() {
            return;
        }

        let document_targets: Vec<(DocumentKey, PartialObserver<DocumentSnapshot>)> = {
            let listeners = self.shared.document_listeners.lock().unwrap();
            listeners
                .iter()
                .filter(|listener| affected.contains(&listener.key))
                .map(|listener| (listener.key.clone(), listener.observer.clone()))
                .collect()
        };
        for (key, observer) in document_targets {
            let snapshot = self.snapshot_for(&key);
            if let Some(next) = &observer.next {
                next(&snapshot);
            }
        }

        let touched_collections: BTreeSet<String> = affected
            .iter()
            .map(|key| key.collection_path().canonical_string())
            .collect();
        let query_targets: Vec<(QueryDefinition, PartialObserver<Vec<DocumentSnapshot>>)> = {
            let listeners = self.shared.query_listeners.lock().unwrap();
            listeners
                .iter()
                .filter(|listener| {
                    touched_collections
                        .contains(&listener.definition.collection_path().canonical_string())
                })
                .map(|listener| (listener.definition.clone(), listener.observer.clone()))
                .collect()
        };
        for (definition, observer) in query_targets {
            self.deliver_query_results(&definition, &observer);
        }
    }

    fn deliver_query_results(
        &self,
        definition: &QueryDefinition,
        observer: &PartialObserver<Vec<DocumentSnapshot>>,
    ) {
        let result = {
            let store = self.shared.documents.lock().unwrap();
            execute_query(&store, definition)
        };
        match result {
            Ok(documents) => {
                if let Some(next) = &observer.next {
                    next(&documents);
                }
            }
            Err(err) => {
                log::warn!("query listener evaluation failed: {err}");
                if let Some(error) = &observer.error {
                    error(&err);
                }
            }
        }
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    // The single in-process copy serves every snapshot source.
    async fn get_document(
        &self,
        key: &DocumentKey,
        _options: SnapshotOptions,
    ) -> StoreResult<DocumentSnapshot> {
        Ok(self.snapshot_for(key))
    }

    async fn set_document(&self, key: &DocumentKey, data: DocumentData) -> StoreResult<()> {
        self.apply_set(key, data)?;
        self.notify(&[key.clone()]);
        Ok(())
    }

    async fn update_document(&self, key: &DocumentKey, data: DocumentData) -> StoreResult<()> {
        self.apply_update(key, data)?;
        self.notify(&[key.clone()]);
        Ok(())
    }

    async fn delete_document(&self, key: &DocumentKey) -> StoreResult<()> {
        self.apply_delete(key)?;
        self.notify(&[key.clone()]);
        Ok(())
    }

    async fn run_query(
        &self,
        query: &QueryDefinition,
        _options: SnapshotOptions,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        let store = self.shared.documents.lock().unwrap();
        execute_query(&store, query)
    }

    async fn commit(&self, writes: Vec<Write>) -> StoreResult<()> {
        let mut affected = Vec::with_capacity(writes.len());
        for write in writes {
            let key = write.key().clone();
            match write {
                Write::Set { key, data } => self.apply_set(&key, data)?,
                Write::Update { key, data } => self.apply_update(&key, data)?,
                Write::Delete { key } => self.apply_delete(&key)?,
            }
            if !affected.contains(&key) {
                affected.push(key);
            }
        }
        self.notify(&affected);
        Ok(())
    }

    fn listen_document(
        &self,
        key: &DocumentKey,
        observer: PartialObserver<DocumentSnapshot>,
    ) -> Unsubscribe {
        let id = self.next_listener_id();
        let initial = self.snapshot_for(key);
        if let Some(next) = &observer.next {
            next(&initial);
        }
        self.shared
            .document_listeners
            .lock()
            .unwrap()
            .push(DocumentListener {
                id,
                key: key.clone(),
                observer,
            });

        let shared = Arc::clone(&self.shared);
        Box::new(move || {
            let mut listeners = shared.document_listeners.lock().unwrap();
            if let Some(position) = listeners.iter().position(|l| l.id == id) {
                let listener = listeners.remove(position);
                if let Some(complete) = &listener.observer.complete {
                    complete();
                }
            }
        })
    }

    fn listen_query(
        &self,
        query: &QueryDefinition,
        observer: PartialObserver<Vec<DocumentSnapshot>>,
    ) -> Unsubscribe {
        let id = self.next_listener_id();
        self.deliver_query_results(query, &observer);
        self.shared
            .query_listeners
            .lock()
            .unwrap()
            .push(QueryListener {
                id,
                definition: query.clone(),
                observer,
            });

        let shared = Arc::clone(&self.shared);
        Box::new(move || {
            let mut listeners = shared.query_listeners.lock().unwrap();
            if let Some(position) = listeners.iter().position(|l| l.id == id) {
                let listener = listeners.remove(position);
                if let Some(complete) = &listener.observer.complete {
                    complete();
                }
            }
        })
    }
}

fn build_snapshot(store: &BTreeMap<String, StoredDocument>, key: &DocumentKey) -> DocumentSnapshot {
    match store.get(&key.path().canonical_string()) {
        Some(stored) => DocumentSnapshot::new(
            key.clone(),
            Some(stored.data.clone()),
            SnapshotMetadata::new(true, false).with_update_time(stored.updated_at),
        ),
        None => DocumentSnapshot::new(key.clone(), None, SnapshotMetadata::new(true, false)),
    }
}

fn execute_query(
    store: &BTreeMap<String, StoredDocument>,
    query: &QueryDefinition,
) -> StoreResult<Vec<DocumentSnapshot>> {
    let mut documents = Vec::new();
    for (path, stored) in store.iter() {
        let key = DocumentKey::from_string(path)?;
        if !query.matches_collection(&key) {
            continue;
        }
        let snapshot = DocumentSnapshot::new(
            key,
            Some(stored.data.clone()),
            SnapshotMetadata::new(true, false).with_update_time(stored.updated_at),
        );
        if document_satisfies_filters(&snapshot, query.filters()) {
            documents.push(snapshot);
        }
    }

    if let Some(order) = query.order_by() {
        documents.sort_by(|left, right| compare_snapshots(left, right, order));
    }

    if let Some(limit) = query.limit() {
        documents.truncate(limit);
    }

    Ok(documents)
}

fn document_satisfies_filters(snapshot: &DocumentSnapshot, filters: &[FieldFilter]) -> bool {
    filters
        .iter()
        .all(|filter| match snapshot.field(filter.field()) {
            Some(value) => evaluate_filter(filter, value),
            None => match filter.operator() {
                FilterOperator::NotEqual => evaluate_filter(filter, &Value::Null),
                _ => false,
            },
        })
}

fn evaluate_filter(filter: &FieldFilter, value: &Value) -> bool {
    match filter.operator() {
        FilterOperator::Equal => value == filter.value(),
        FilterOperator::NotEqual => value != filter.value(),
        FilterOperator::LessThan => compare_values(value, filter.value()) == Some(Ordering::Less),
        FilterOperator::LessThanOrEqual => matches!(
            compare_values(value, filter.value()),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
        FilterOperator::GreaterThan => {
            compare_values(value, filter.value()) == Some(Ordering::Greater)
        }
        FilterOperator::GreaterThanOrEqual => matches!(
            compare_values(value, filter.value()),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
        FilterOperator::ArrayContains => value
            .as_array()
            .map(|array| array.contains(filter.value()))
            .unwrap_or(false),
    }
}

fn compare_snapshots(
    left: &DocumentSnapshot,
    right: &DocumentSnapshot,
    order: &OrderBy,
) -> Ordering {
    let left_value = left.field(order.field()).cloned().unwrap_or(Value::Null);
    let right_value = right.field(order.field()).cloned().unwrap_or(Value::Null);
    let mut ordering = compare_values(&left_value, &right_value).unwrap_or(Ordering::Equal);
    if order.direction() == OrderDirection::Descending {
        ordering = ordering.reverse();
    }
    ordering
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
