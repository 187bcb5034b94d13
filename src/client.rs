use std::sync::Arc;

use serde::Serialize;

use crate::batch::{commit_chunked, Write, WriteBatch};
use crate::datastore::{Datastore, InMemoryDatastore};
use crate::error::{StoreError, StoreResult};
use crate::model::FieldPath;
use crate::observer::{NextFn, PartialObserver, Unsubscribe};
use crate::query::Query;
use crate::reference::{CollectionReference, DocumentReference};
use crate::snapshot::{DocumentSnapshot, QuerySnapshot, SnapshotOptions};
use crate::store::Store;
use crate::value::{to_document_data, DocumentData};

/// The convenience layer over a [`Datastore`].
///
/// Reads can project their results onto dotted field paths (shaped into
/// nested mappings), batched writes are transparently chunked, and snapshot
/// listeners are forwarded to the datastore's subscription mechanism. All
/// datastore failures surface to the caller unchanged.
#[derive(Clone)]
pub struct StoreClient {
    store: Store,
    datastore: Arc<dyn Datastore>,
}

impl StoreClient {
    /// Creates a client backed by the supplied datastore implementation.
    pub fn new(store: Store, datastore: Arc<dyn Datastore>) -> Self {
        Self { store, datastore }
    }

    /// Returns a client that stores documents in memory only.
    pub fn with_in_memory(store: Store) -> Self {
        Self::new(store, Arc::new(InMemoryDatastore::new()))
    }

    /// Returns the store handle this client resolves references against.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Creates a new write batch targeting the same store as this client.
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.store.clone(), Arc::clone(&self.datastore))
    }

    /// Fetches the document at `reference`.
    ///
    /// When `field_paths` is given, the snapshot data is replaced with the
    /// requested paths shaped into nested mappings; paths missing from the
    /// document shape around `null`. `options` are handed to the datastore
    /// untouched; `None` stands for [`SnapshotOptions::default`].
    pub async fn get_doc(
        &self,
        reference: &DocumentReference,
        field_paths: Option<&[FieldPath]>,
        options: Option<SnapshotOptions>,
    ) -> StoreResult<DocumentSnapshot> {
        self.ensure_same_store(reference.store())?;
        let snapshot = self
            .datastore
            .get_document(reference.key(), options.unwrap_or_default())
            .await?;
        Ok(apply_shaping(snapshot, field_paths))
    }

    /// Data-only variant of [`get_doc`](Self::get_doc): returns the (possibly
    /// shaped) fields, or `None` when the document does not exist.
    pub async fn get_doc_data(
        &self,
        reference: &DocumentReference,
        field_paths: Option<&[FieldPath]>,
        options: Option<SnapshotOptions>,
    ) -> StoreResult<Option<DocumentData>> {
        Ok(self
            .get_doc(reference, field_paths, options)
            .await?
            .into_data())
    }

    /// Executes `query` and returns its results in datastore order, applying
    /// the same shaping and options rules as [`get_doc`](Self::get_doc) per
    /// document.
    pub async fn get_docs(
        &self,
        query: &Query,
        field_paths: Option<&[FieldPath]>,
        options: Option<SnapshotOptions>,
    ) -> StoreResult<QuerySnapshot> {
        self.ensure_same_store(query.store())?;
        let documents = self
            .datastore
            .run_query(query.definition(), options.unwrap_or_default())
            .await?;
        let documents = documents
            .into_iter()
            .map(|snapshot| apply_shaping(snapshot, field_paths))
            .collect();
        Ok(QuerySnapshot::new(query.clone(), documents))
    }

    /// Data-only variant of [`get_docs`](Self::get_docs).
    pub async fn get_docs_data(
        &self,
        query: &Query,
        field_paths: Option<&[FieldPath]>,
        options: Option<SnapshotOptions>,
    ) -> StoreResult<Vec<DocumentData>> {
        let snapshot = self.get_docs(query, field_paths, options).await?;
        Ok(snapshot
            .into_documents()
            .into_iter()
            .filter_map(DocumentSnapshot::into_data)
            .collect())
    }

    /// Writes a typed model to the document at `reference`, replacing any
    /// existing data.
    pub async fn set_doc<T>(&self, reference: &DocumentReference, value: &T) -> StoreResult<()>
    where
        T: Serialize,
    {
        self.set_doc_data(reference, to_document_data(value)?).await
    }

    /// Writes raw document fields to the document at `reference`.
    pub async fn set_doc_data(
        &self,
        reference: &DocumentReference,
        data: DocumentData,
    ) -> StoreResult<()> {
        self.ensure_same_store(reference.store())?;
        self.datastore.set_document(reference.key(), data).await
    }

    /// Applies a partial update to the document at `reference`; the document
    /// must exist.
    pub async fn update_doc<T>(&self, reference: &DocumentReference, value: &T) -> StoreResult<()>
    where
        T: Serialize,
    {
        self.update_doc_data(reference, to_document_data(value)?)
            .await
    }

    pub async fn update_doc_data(
        &self,
        reference: &DocumentReference,
        data: DocumentData,
    ) -> StoreResult<()> {
        self.ensure_same_store(reference.store())?;
        self.datastore.update_document(reference.key(), data).await
    }

    /// Adds a new document with an auto-generated id to `collection` and
    /// returns its reference.
    pub async fn add_doc<T>(
        &self,
        collection: &CollectionReference,
        value: &T,
    ) -> StoreResult<DocumentReference>
    where
        T: Serialize,
    {
        let reference = collection.doc(None)?;
        self.set_doc(&reference, value).await?;
        Ok(reference)
    }

    /// Deletes the document at `reference`. Direct passthrough; succeeds even
    /// if the document does not exist.
    pub async fn delete_doc(&self, reference: &DocumentReference) -> StoreResult<()> {
        self.ensure_same_store(reference.store())?;
        self.datastore.delete_document(reference.key()).await
    }

    /// Applies `writes` in order, split into atomic commits of at most
    /// [`MAX_BATCH_WRITES`](crate::batch::MAX_BATCH_WRITES) operations each.
    ///
    /// Chunk commits run concurrently; the first failure surfaces and already
    /// committed chunks are not rolled back.
    pub async fn write_all(&self, writes: Vec<Write>) -> StoreResult<()> {
        commit_chunked(&self.datastore, writes).await
    }

    /// Subscribes to live snapshots of one document.
    ///
    /// Snapshots are delivered until the returned teardown is invoked; this
    /// layer never tears a listener down on its own.
    pub fn on_snapshot(
        &self,
        reference: &DocumentReference,
        observer: PartialObserver<DocumentSnapshot>,
    ) -> StoreResult<Unsubscribe> {
        self.ensure_same_store(reference.store())?;
        Ok(self.datastore.listen_document(reference.key(), observer))
    }

    /// Subscribes to live result sets of a query.
    pub fn on_query_snapshot(
        &self,
        query: &Query,
        observer: PartialObserver<QuerySnapshot>,
    ) -> StoreResult<Unsubscribe> {
        self.ensure_same_store(query.store())?;
        let next = observer.next.map(|next| {
            let query = query.clone();
            Arc::new(move |documents: &Vec<DocumentSnapshot>| {
                let snapshot = QuerySnapshot::new(query.clone(), documents.clone());
                next(&snapshot);
            }) as NextFn<Vec<DocumentSnapshot>>
        });
        let inner = PartialObserver {
            next,
            error: observer.error,
            complete: observer.complete,
        };
        Ok(self.datastore.listen_query(query.definition(), inner))
    }

    fn ensure_same_store(&self, other: &Store) -> StoreResult<()> {
        if self.store.database_id() != other.database_id() {
            return Err(StoreError::internal(
                "Reference targets a different store instance than this client",
            ));
        }
        Ok(())
    }
}

fn apply_shaping(
    snapshot: DocumentSnapshot,
    field_paths: Option<&[FieldPath]>,
) -> DocumentSnapshot {
    match field_paths {
        Some(paths) => snapshot.with_shaped_data(paths),
        None => snapshot,
    }
}
