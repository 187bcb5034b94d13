//! Batched multi-writes.
//!
//! The underlying datastore accepts at most [`MAX_BATCH_WRITES`] operations
//! per atomic commit. Anything longer is partitioned into consecutive chunks,
//! each committed as its own batch, with every chunk commit raced
//! concurrently. Chunks are independent atomic units: a failed chunk does not
//! roll back chunks already committed or in flight, and the first failure is
//! the one surfaced to the caller.

use std::sync::Arc;

use serde::Serialize;

use crate::datastore::Datastore;
use crate::error::{StoreError, StoreResult};
use crate::model::DocumentKey;
use crate::reference::DocumentReference;
use crate::store::Store;
use crate::value::{to_document_data, DocumentData};

/// Maximum number of operations a single atomic commit may carry.
pub const MAX_BATCH_WRITES: usize = 500;

/// A single queued write operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Write {
    Set {
        key: DocumentKey,
        data: DocumentData,
    },
    Update {
        key: DocumentKey,
        data: DocumentData,
    },
    Delete {
        key: DocumentKey,
    },
}

impl Write {
    /// Builds a set operation from a typed model.
    pub fn set<T>(reference: &DocumentReference, value: &T) -> StoreResult<Self>
    where
        T: Serialize,
    {
        Ok(Self::set_data(reference, to_document_data(value)?))
    }

    pub fn set_data(reference: &DocumentReference, data: DocumentData) -> Self {
        Write::Set {
            key: reference.key().clone(),
            data,
        }
    }

    /// Builds an update operation from a typed model.
    pub fn update<T>(reference: &DocumentReference, value: &T) -> StoreResult<Self>
    where
        T: Serialize,
    {
        Ok(Self::update_data(reference, to_document_data(value)?))
    }

    pub fn update_data(reference: &DocumentReference, data: DocumentData) -> Self {
        Write::Update {
            key: reference.key().clone(),
            data,
        }
    }

    pub fn delete(reference: &DocumentReference) -> Self {
        Write::Delete {
            key: reference.key().clone(),
        }
    }

    /// The document this write targets.
    pub fn key(&self) -> &DocumentKey {
        match self {
            Write::Set { key, .. } | Write::Update { key, .. } | Write::Delete { key } => key,
        }
    }
}

/// Partitions writes into commit-sized chunks, preserving order within and
/// across chunks.
///
/// An empty input still produces one (empty) chunk, so the writer issues
/// exactly one commit in that case.
pub(crate) fn chunk_writes(mut writes: Vec<Write>) -> Vec<Vec<Write>> {
    if writes.len() <= MAX_BATCH_WRITES {
        return vec![writes];
    }
    let mut chunks = Vec::with_capacity(writes.len().div_ceil(MAX_BATCH_WRITES));
    while writes.len() > MAX_BATCH_WRITES {
        let rest = writes.split_off(MAX_BATCH_WRITES);
        chunks.push(writes);
        writes = rest;
    }
    chunks.push(writes);
    chunks
}

/// Commits every chunk concurrently against `datastore`.
pub(crate) async fn commit_chunked(
    datastore: &Arc<dyn Datastore>,
    writes: Vec<Write>,
) -> StoreResult<()> {
    let chunks = chunk_writes(writes);
    if chunks.len() > 1 {
        log::debug!("splitting batched write into {} commits", chunks.len());
    }
    let commits = chunks.into_iter().map(|chunk| datastore.commit(chunk));
    futures::future::try_join_all(commits).await?;
    Ok(())
}

/// Aggregates write operations and commits them in chunks of at most
/// [`MAX_BATCH_WRITES`].
///
/// Unlike a raw datastore batch, this builder never rejects the 501st write;
/// `commit` transparently fans the queue out over as many atomic commits as
/// needed.
#[derive(Clone)]
pub struct WriteBatch {
    store: Store,
    datastore: Arc<dyn Datastore>,
    writes: Vec<Write>,
}

impl WriteBatch {
    pub(crate) fn new(store: Store, datastore: Arc<dyn Datastore>) -> Self {
        Self {
            store,
            datastore,
            writes: Vec::new(),
        }
    }

    /// Queues a set operation for a typed model.
    pub fn set<T>(&mut self, reference: &DocumentReference, value: &T) -> StoreResult<&mut Self>
    where
        T: Serialize,
    {
        self.ensure_same_store(reference.store())?;
        self.writes.push(Write::set(reference, value)?);
        Ok(self)
    }

    /// Queues a set operation with raw document fields.
    pub fn set_data(
        &mut self,
        reference: &DocumentReference,
        data: DocumentData,
    ) -> StoreResult<&mut Self> {
        self.ensure_same_store(reference.store())?;
        self.writes.push(Write::set_data(reference, data));
        Ok(self)
    }

    /// Queues an update operation for a typed model.
    pub fn update<T>(&mut self, reference: &DocumentReference, value: &T) -> StoreResult<&mut Self>
    where
        T: Serialize,
    {
        self.ensure_same_store(reference.store())?;
        self.writes.push(Write::update(reference, value)?);
        Ok(self)
    }

    /// Queues an update operation with raw document fields.
    pub fn update_data(
        &mut self,
        reference: &DocumentReference,
        data: DocumentData,
    ) -> StoreResult<&mut Self> {
        self.ensure_same_store(reference.store())?;
        self.writes.push(Write::update_data(reference, data));
        Ok(self)
    }

    /// Queues a delete operation.
    pub fn delete(&mut self, reference: &DocumentReference) -> StoreResult<&mut Self> {
        self.ensure_same_store(reference.store())?;
        self.writes.push(Write::delete(reference));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Commits all queued writes, chunked per [`MAX_BATCH_WRITES`].
    pub async fn commit(self) -> StoreResult<()> {
        let Self {
            datastore, writes, ..
        } = self;
        commit_chunked(&datastore, writes).await
    }

    fn ensure_same_store(&self, other: &Store) -> StoreResult<()> {
        if self.store.database_id() != other.database_id() {
            return Err(StoreError::invalid_argument(
                "All WriteBatch operations must target the same store instance",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delete_write(index: usize) -> Write {
        Write::Delete {
            key: DocumentKey::from_string(&format!("items/{index}")).unwrap(),
        }
    }

    fn writes(count: usize) -> Vec<Write> {
        (0..count).map(delete_write).collect()
    }

    #[test]
    fn chunk_counts_match_write_counts() {
        for (count, expected) in [(0, 1), (1, 1), (500, 1), (501, 2), (1000, 2)] {
            let chunks = chunk_writes(writes(count));
            assert_eq!(chunks.len(), expected, "count {count}");
        }
    }

    #[test]
    fn chunk_sizes_for_overflowing_lists() {
        let chunks = chunk_writes(writes(501));
        let sizes: Vec<_> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![500, 1]);

        let chunks = chunk_writes(writes(1000));
        let sizes: Vec<_> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![500, 500]);
    }

    #[test]
    fn chunking_preserves_order() {
        let original = writes(1203);
        let flattened: Vec<_> = chunk_writes(original.clone()).into_iter().flatten().collect();
        assert_eq!(flattened, original);
    }

    #[test]
    fn empty_list_yields_one_empty_chunk() {
        let chunks = chunk_writes(Vec::new());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
    }
}
