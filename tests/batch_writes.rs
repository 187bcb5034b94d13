use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use docstore_kit::{
    Datastore, DocumentKey, DocumentSnapshot, PartialObserver, SnapshotMetadata, SnapshotOptions,
    Store, StoreClient, StoreError, StoreOptions, StoreResult, Unsubscribe, Write,
};
use docstore_kit::query::QueryDefinition;
use docstore_kit::value::DocumentData;

/// Records every commit it receives without applying anything.
#[derive(Default)]
struct RecordingDatastore {
    commits: Mutex<Vec<Vec<Write>>>,
}

impl RecordingDatastore {
    fn recorded(&self) -> Vec<Vec<Write>> {
        self.commits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Datastore for RecordingDatastore {
    async fn get_document(
        &self,
        key: &DocumentKey,
        _options: SnapshotOptions,
    ) -> StoreResult<DocumentSnapshot> {
        Ok(DocumentSnapshot::new(
            key.clone(),
            None,
            SnapshotMetadata::default(),
        ))
    }

    async fn set_document(&self, _key: &DocumentKey, _data: DocumentData) -> StoreResult<()> {
        Ok(())
    }

    async fn update_document(&self, _key: &DocumentKey, _data: DocumentData) -> StoreResult<()> {
        Ok(())
    }

    async fn delete_document(&self, _key: &DocumentKey) -> StoreResult<()> {
        Ok(())
    }

    async fn run_query(
        &self,
        _query: &QueryDefinition,
        _options: SnapshotOptions,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        Ok(Vec::new())
    }

    async fn commit(&self, writes: Vec<Write>) -> StoreResult<()> {
        self.commits.lock().unwrap().push(writes);
        Ok(())
    }

    fn listen_document(
        &self,
        _key: &DocumentKey,
        _observer: PartialObserver<DocumentSnapshot>,
    ) -> Unsubscribe {
        Box::new(|| {})
    }

    fn listen_query(
        &self,
        _query: &QueryDefinition,
        _observer: PartialObserver<Vec<DocumentSnapshot>>,
    ) -> Unsubscribe {
        Box::new(|| {})
    }
}

/// Accepts the first `succeed_first` commits, then rejects the rest.
#[derive(Default)]
struct FailingDatastore {
    succeed_first: usize,
    attempts: AtomicUsize,
}

#[async_trait]
impl Datastore for FailingDatastore {
    async fn get_document(
        &self,
        key: &DocumentKey,
        _options: SnapshotOptions,
    ) -> StoreResult<DocumentSnapshot> {
        Ok(DocumentSnapshot::new(
            key.clone(),
            None,
            SnapshotMetadata::default(),
        ))
    }

    async fn set_document(&self, _key: &DocumentKey, _data: DocumentData) -> StoreResult<()> {
        Ok(())
    }

    async fn update_document(&self, _key: &DocumentKey, _data: DocumentData) -> StoreResult<()> {
        Ok(())
    }

    async fn delete_document(&self, _key: &DocumentKey) -> StoreResult<()> {
        Ok(())
    }

    async fn run_query(
        &self,
        _query: &QueryDefinition,
        _options: SnapshotOptions,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        Ok(Vec::new())
    }

    async fn commit(&self, _writes: Vec<Write>) -> StoreResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.succeed_first {
            Ok(())
        } else {
            Err(StoreError::unavailable("backend rejected the commit"))
        }
    }

    fn listen_document(
        &self,
        _key: &DocumentKey,
        _observer: PartialObserver<DocumentSnapshot>,
    ) -> Unsubscribe {
        Box::new(|| {})
    }

    fn listen_query(
        &self,
        _query: &QueryDefinition,
        _observer: PartialObserver<Vec<DocumentSnapshot>>,
    ) -> Unsubscribe {
        Box::new(|| {})
    }
}

fn store() -> Store {
    Store::new(StoreOptions {
        project_id: Some("project".into()),
        ..Default::default()
    })
    .unwrap()
}

fn delete_writes(store: &Store, count: usize) -> Vec<Write> {
    (0..count)
        .map(|index| Write::delete(&store.doc(&format!("items/{index}")).unwrap()))
        .collect()
}

#[tokio::test]
async fn commit_counts_for_boundary_sizes() {
    for (count, expected_commits) in [(0, 1), (1, 1), (500, 1), (501, 2), (1000, 2)] {
        let store = store();
        let datastore = Arc::new(RecordingDatastore::default());
        let client = StoreClient::new(store.clone(), datastore.clone());

        client
            .write_all(delete_writes(&store, count))
            .await
            .unwrap();

        let recorded = datastore.recorded();
        assert_eq!(recorded.len(), expected_commits, "write count {count}");
    }
}

#[tokio::test]
async fn chunk_sizes_for_overflowing_lists() {
    let store = store();
    let datastore = Arc::new(RecordingDatastore::default());
    let client = StoreClient::new(store.clone(), datastore.clone());

    client
        .write_all(delete_writes(&store, 501))
        .await
        .unwrap();
    let sizes: Vec<_> = datastore.recorded().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![500, 1]);

    let datastore = Arc::new(RecordingDatastore::default());
    let client = StoreClient::new(store.clone(), datastore.clone());
    client
        .write_all(delete_writes(&store, 1000))
        .await
        .unwrap();
    let sizes: Vec<_> = datastore.recorded().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![500, 500]);
}

#[tokio::test]
async fn order_is_preserved_across_chunks() {
    let store = store();
    let datastore = Arc::new(RecordingDatastore::default());
    let client = StoreClient::new(store.clone(), datastore.clone());

    let writes = delete_writes(&store, 1203);
    client.write_all(writes.clone()).await.unwrap();

    let flattened: Vec<Write> = datastore.recorded().into_iter().flatten().collect();
    assert_eq!(flattened, writes);
}

#[tokio::test]
async fn payloads_stay_with_their_chunk() {
    let store = store();
    let datastore = Arc::new(RecordingDatastore::default());
    let client = StoreClient::new(store.clone(), datastore.clone());

    let writes: Vec<Write> = (0..750)
        .map(|index| {
            let reference = store.doc(&format!("items/{index}")).unwrap();
            Write::set_data(
                &reference,
                json!({"index": index}).as_object().unwrap().clone(),
            )
        })
        .collect();
    client.write_all(writes.clone()).await.unwrap();

    let recorded = datastore.recorded();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].len(), 500);
    assert_eq!(recorded[1].len(), 250);
    for (index, write) in recorded.iter().flatten().enumerate() {
        assert_eq!(write, &writes[index]);
        match write {
            Write::Set { key, data } => {
                assert_eq!(key.id(), index.to_string());
                assert_eq!(data.get("index"), Some(&json!(index)));
            }
            other => panic!("expected set write, found {other:?}"),
        }
    }
}

#[tokio::test]
async fn failing_chunk_fails_the_whole_write() {
    let store = store();
    let datastore = Arc::new(FailingDatastore {
        succeed_first: 1,
        ..Default::default()
    });
    let client = StoreClient::new(store.clone(), datastore);

    let err = client
        .write_all(delete_writes(&store, 750))
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "docstore/unavailable");
}

#[tokio::test]
async fn every_chunk_failing_surfaces_first_error() {
    let store = store();
    let datastore = Arc::new(FailingDatastore::default());
    let client = StoreClient::new(store.clone(), datastore);

    let err = client
        .write_all(delete_writes(&store, 3))
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "docstore/unavailable");
}

#[tokio::test]
async fn write_batch_builder_chunks_like_write_all() {
    let store = store();
    let datastore = Arc::new(RecordingDatastore::default());
    let client = StoreClient::new(store.clone(), datastore.clone());

    let mut batch = client.batch();
    for index in 0..501 {
        let reference = store.doc(&format!("items/{index}")).unwrap();
        batch.delete(&reference).unwrap();
    }
    assert_eq!(batch.len(), 501);
    batch.commit().await.unwrap();

    let sizes: Vec<_> = datastore.recorded().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![500, 1]);
}
