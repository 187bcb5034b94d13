use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::model::{DatabaseId, ResourcePath};
use crate::query::Query;
use crate::reference::{CollectionReference, DocumentReference};

/// Configuration for a [`Store`] handle.
#[derive(Clone, Debug, Default)]
pub struct StoreOptions {
    /// The project hosting the database. Required.
    pub project_id: Option<String>,
    /// Logical database name; defaults to `"(default)"`.
    pub database: Option<String>,
}

/// A cheaply clonable handle identifying one database.
///
/// The handle holds no connection state of its own; it mints references and
/// queries that a [`StoreClient`](crate::client::StoreClient) resolves against
/// a datastore.
#[derive(Clone, Debug)]
pub struct Store {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    database_id: DatabaseId,
}

impl Store {
    pub fn new(options: StoreOptions) -> StoreResult<Self> {
        let project_id = options.project_id.ok_or_else(StoreError::missing_project_id)?;
        let database_id = match options.database {
            Some(database) => DatabaseId::new(project_id, database),
            None => DatabaseId::default_database(project_id),
        };
        Ok(Self {
            inner: Arc::new(StoreInner { database_id }),
        })
    }

    /// The fully qualified database identifier (project + database name).
    pub fn database_id(&self) -> &DatabaseId {
        &self.inner.database_id
    }

    /// Returns the project identifier backing this database.
    pub fn project_id(&self) -> &str {
        self.inner.database_id.project_id()
    }

    /// Returns the logical database name (usually `"(default)"`).
    pub fn database(&self) -> &str {
        self.inner.database_id.database()
    }

    /// Creates a `CollectionReference` pointing at `path`.
    ///
    /// The path is interpreted relative to the store root using forward
    /// slashes to separate segments (e.g. `"users/alovelace/repos"`).
    pub fn collection(&self, path: &str) -> StoreResult<CollectionReference> {
        let resource = ResourcePath::from_string(path)?;
        CollectionReference::new(self.clone(), resource)
    }

    /// Creates a `DocumentReference` pointing at `path`.
    ///
    /// The path must contain an even number of segments (collection/doc pairs).
    pub fn doc(&self, path: &str) -> StoreResult<DocumentReference> {
        let resource = ResourcePath::from_string(path)?;
        DocumentReference::new(self.clone(), resource)
    }

    /// Creates a query over the collection at `path`.
    pub fn query(&self, path: &str) -> StoreResult<Query> {
        Ok(self.collection(path)?.query())
    }
}
