use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreResult;
use crate::model::{DocumentKey, FieldPath};
use crate::query::Query;
use crate::shape;
use crate::value::{from_document_data, DocumentData};

/// Where a read may be served from.
///
/// Forwarded to the datastore unchanged; this layer attaches no meaning to
/// it, and datastores without a cache are free to ignore it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SnapshotSource {
    /// The datastore picks, typically the backend with a cache fallback.
    #[default]
    Default,
    /// Only accept a result from the backend.
    Server,
    /// Only accept a locally cached result.
    Cache,
}

/// Options for a single read, passed through to the datastore.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub source: SnapshotSource,
}

impl SnapshotOptions {
    pub fn from_source(source: SnapshotSource) -> Self {
        Self { source }
    }
}

/// Metadata about the state of a document snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotMetadata {
    from_cache: bool,
    has_pending_writes: bool,
    update_time: Option<DateTime<Utc>>,
}

impl SnapshotMetadata {
    pub fn new(from_cache: bool, has_pending_writes: bool) -> Self {
        Self {
            from_cache,
            has_pending_writes,
            update_time: None,
        }
    }

    pub fn with_update_time(mut self, update_time: DateTime<Utc>) -> Self {
        self.update_time = Some(update_time);
        self
    }

    /// Indicates whether the snapshot was served from a local cache.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Indicates whether the snapshot contains uncommitted local mutations.
    pub fn has_pending_writes(&self) -> bool {
        self.has_pending_writes
    }

    /// The last write time recorded by the datastore, when known.
    pub fn update_time(&self) -> Option<DateTime<Utc>> {
        self.update_time
    }
}

/// The state of a single document at read time: its data (if it exists), its
/// id and metadata.
#[derive(Clone, Debug)]
pub struct DocumentSnapshot {
    key: DocumentKey,
    data: Option<DocumentData>,
    metadata: SnapshotMetadata,
}

impl DocumentSnapshot {
    pub fn new(key: DocumentKey, data: Option<DocumentData>, metadata: SnapshotMetadata) -> Self {
        Self {
            key,
            data,
            metadata,
        }
    }

    /// Returns whether the document exists in the datastore.
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn id(&self) -> &str {
        self.key.id()
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Returns the decoded document fields if the snapshot contains data.
    pub fn data(&self) -> Option<&DocumentData> {
        self.data.as_ref()
    }

    /// Consumes the snapshot, keeping only its data.
    pub fn into_data(self) -> Option<DocumentData> {
        self.data
    }

    /// Decodes the document fields into a typed model.
    pub fn data_as<T>(&self) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        match &self.data {
            Some(data) => Ok(Some(from_document_data(data)?)),
            None => Ok(None),
        }
    }

    /// Resolves a single dotted field path within the document data.
    pub fn field(&self, path: &FieldPath) -> Option<&Value> {
        shape::value_at(self.data.as_ref()?, path)
    }

    /// Returns the snapshot with its data projected onto the requested field
    /// paths, shaped into nested mappings.
    pub fn with_shaped_data(self, paths: &[FieldPath]) -> Self {
        let shaped = self
            .data
            .as_ref()
            .map(|data| shape::shape_document(data, paths));
        Self {
            data: shaped,
            ..self
        }
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }
}

/// The result of executing a query: document snapshots in datastore order.
#[derive(Clone, Debug)]
pub struct QuerySnapshot {
    query: Query,
    documents: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub fn new(query: Query, documents: Vec<DocumentSnapshot>) -> Self {
        Self { query, documents }
    }

    /// Returns the query used to obtain this snapshot.
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<DocumentSnapshot> {
        self.documents
    }
}
