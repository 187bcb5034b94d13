//! Reads hand their snapshot options to the datastore untouched.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use docstore_kit::query::QueryDefinition;
use docstore_kit::value::DocumentData;
use docstore_kit::{
    Datastore, DocumentKey, DocumentSnapshot, PartialObserver, SnapshotMetadata, SnapshotOptions,
    SnapshotSource, Store, StoreClient, StoreOptions, StoreResult, Unsubscribe, Write,
};

/// Records the options every read arrives with.
#[derive(Default)]
struct OptionRecordingDatastore {
    received: Mutex<Vec<SnapshotOptions>>,
}

impl OptionRecordingDatastore {
    fn received(&self) -> Vec<SnapshotOptions> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Datastore for OptionRecordingDatastore {
    async fn get_document(
        &self,
        key: &DocumentKey,
        options: SnapshotOptions,
    ) -> StoreResult<DocumentSnapshot> {
        self.received.lock().unwrap().push(options);
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
        options: SnapshotOptions,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        self.received.lock().unwrap().push(options);
        Ok(Vec::new())
    }

    async fn commit(&self, _writes: Vec<Write>) -> StoreResult<()> {
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

fn build() -> (StoreClient, Store, Arc<OptionRecordingDatastore>) {
    let store = Store::new(StoreOptions {
        project_id: Some("project".into()),
        ..Default::default()
    })
    .unwrap();
    let datastore = Arc::new(OptionRecordingDatastore::default());
    let client = StoreClient::new(store.clone(), datastore.clone());
    (client, store, datastore)
}

#[tokio::test]
async fn get_doc_forwards_its_options() {
    let (client, store, datastore) = build();
    let reference = store.doc("cities/sf").unwrap();

    let options = SnapshotOptions::from_source(SnapshotSource::Cache);
    client
        .get_doc(&reference, None, Some(options))
        .await
        .unwrap();
    client.get_doc(&reference, None, None).await.unwrap();

    assert_eq!(
        datastore.received(),
        vec![options, SnapshotOptions::default()]
    );
}

#[tokio::test]
async fn get_docs_forwards_its_options() {
    let (client, store, datastore) = build();
    let query = store.query("cities").unwrap();

    let options = SnapshotOptions::from_source(SnapshotSource::Server);
    client.get_docs(&query, None, Some(options)).await.unwrap();
    client.get_docs_data(&query, None, None).await.unwrap();

    assert_eq!(
        datastore.received(),
        vec![options, SnapshotOptions::default()]
    );
}
