use async_trait::async_trait;

use crate::batch::Write;
use crate::error::StoreResult;
use crate::model::DocumentKey;
use crate::observer::{PartialObserver, Unsubscribe};
use crate::query::QueryDefinition;
use crate::snapshot::{DocumentSnapshot, SnapshotOptions};
use crate::value::DocumentData;

pub mod in_memory;

/// The document-database client this crate layers over.
///
/// Every substantive operation (reads, writes, query execution, atomic batch
/// commit, real-time subscription) is delegated through this trait; failures
/// it produces are forwarded to callers unchanged. `commit` applies at most
/// [`MAX_BATCH_WRITES`](crate::batch::MAX_BATCH_WRITES) operations as one
/// atomic unit, in the order given.
#[async_trait]
pub trait Datastore: Send + Sync + 'static {
    async fn get_document(
        &self,
        key: &DocumentKey,
        options: SnapshotOptions,
    ) -> StoreResult<DocumentSnapshot>;
    async fn set_document(&self, key: &DocumentKey, data: DocumentData) -> StoreResult<()>;
    async fn update_document(&self, key: &DocumentKey, data: DocumentData) -> StoreResult<()>;
    async fn delete_document(&self, key: &DocumentKey) -> StoreResult<()>;
    async fn run_query(
        &self,
        query: &QueryDefinition,
        options: SnapshotOptions,
    ) -> StoreResult<Vec<DocumentSnapshot>>;
    async fn commit(&self, writes: Vec<Write>) -> StoreResult<()>;

    /// Registers a live listener for one document. Snapshots are delivered to
    /// the observer until the returned teardown is invoked.
    fn listen_document(
        &self,
        key: &DocumentKey,
        observer: PartialObserver<DocumentSnapshot>,
    ) -> Unsubscribe;

    /// Registers a live listener for a query's result set.
    fn listen_query(
        &self,
        query: &QueryDefinition,
        observer: PartialObserver<Vec<DocumentSnapshot>>,
    ) -> Unsubscribe;
}

pub use in_memory::InMemoryDatastore;
