use std::fmt::{Display, Formatter};

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::error::{StoreError, StoreResult};
use crate::model::{DocumentKey, ResourcePath};
use crate::query::Query;
use crate::store::Store;

const AUTO_ID_LENGTH: usize = 20;

/// A reference to a collection in the store.
#[derive(Clone, Debug)]
pub struct CollectionReference {
    store: Store,
    path: ResourcePath,
}

impl CollectionReference {
    pub(crate) fn new(store: Store, path: ResourcePath) -> StoreResult<Self> {
        if !path.is_collection_path() {
            return Err(StoreError::invalid_argument(format!(
                "\"{path}\" does not name a collection"
            )));
        }
        Ok(Self { store, path })
    }

    /// Returns the store instance that created this collection reference.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The full resource path of the collection (e.g. `rooms/eros/messages`).
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The last segment of the collection path.
    pub fn id(&self) -> &str {
        self.path
            .last_segment()
            .expect("Collection path always has id")
    }

    /// Returns a reference to the document identified by `document_id`.
    ///
    /// When `document_id` is `None`, an auto-ID is generated.
    pub fn doc(&self, document_id: Option<&str>) -> StoreResult<DocumentReference> {
        let id = document_id
            .map(|id| id.to_string())
            .unwrap_or_else(generate_auto_id);
        if id.contains('/') {
            return Err(StoreError::invalid_argument("Document ID cannot contain '/'."));
        }
        let path = self.path.child(id);
        DocumentReference::new(self.store.clone(), path)
    }

    /// Creates a query that targets this collection.
    pub fn query(&self) -> Query {
        Query::new(self.store.clone(), self.path.clone())
            .expect("CollectionReference always points to a valid collection")
    }
}

impl Display for CollectionReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CollectionReference({})", self.path.canonical_string())
    }
}

/// A reference to a single document in the store.
#[derive(Clone, Debug)]
pub struct DocumentReference {
    store: Store,
    key: DocumentKey,
}

impl DocumentReference {
    pub(crate) fn new(store: Store, path: ResourcePath) -> StoreResult<Self> {
        let key = DocumentKey::from_path(path)?;
        Ok(Self { store, key })
    }

    /// Returns the store instance that created this document reference.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The document identifier (the last segment of its path).
    pub fn id(&self) -> &str {
        self.key.id()
    }

    /// The full resource path to the document.
    pub fn path(&self) -> &ResourcePath {
        self.key.path()
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// The parent collection containing this document.
    pub fn parent(&self) -> CollectionReference {
        CollectionReference::new(self.store.clone(), self.key.collection_path())
            .expect("Document parent path is always a collection")
    }
}

impl Display for DocumentReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentReference({})", self.key.path().canonical_string())
    }
}

fn generate_auto_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(AUTO_ID_LENGTH)
        .collect()
}
