//! Typed helpers over a document-database client.
//!
//! The client itself is consumed as an opaque capability through the
//! [`Datastore`] trait; this crate adds the ergonomics around it:
//!
//! - **Field-path shaping**: project reads onto dotted field paths,
//!   returning nested mappings ([`shape`]).
//! - **Chunked batch writes**: arbitrarily long write lists are split into
//!   atomic commits of at most [`MAX_BATCH_WRITES`] operations, raced
//!   concurrently ([`batch`]).
//! - **Snapshot listeners**: document and query subscriptions with
//!   next/error/complete observers ([`observer`]).
//!
//! ```no_run
//! use docstore_kit::{Store, StoreClient, StoreOptions, Write};
//!
//! # async fn run() -> docstore_kit::StoreResult<()> {
//! let store = Store::new(StoreOptions {
//!     project_id: Some("demo".into()),
//!     ..Default::default()
//! })?;
//! let client = StoreClient::with_in_memory(store.clone());
//!
//! let reference = store.doc("cities/sf")?;
//! let writes = vec![Write::delete(&reference)];
//! client.write_all(writes).await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod datastore;
pub mod error;
pub mod model;
pub mod observer;
pub mod query;
pub mod reference;
pub mod shape;
pub mod snapshot;
pub mod store;
pub mod value;

pub use batch::{Write, WriteBatch, MAX_BATCH_WRITES};
pub use client::StoreClient;
pub use datastore::{Datastore, InMemoryDatastore};
pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use model::{DatabaseId, DocumentKey, FieldPath, IntoFieldPath, ResourcePath};
pub use observer::{PartialObserver, Unsubscribe};
pub use query::{FilterOperator, OrderDirection, Query};
pub use reference::{CollectionReference, DocumentReference};
pub use snapshot::{DocumentSnapshot, QuerySnapshot, SnapshotMetadata, SnapshotOptions, SnapshotSource};
pub use store::{Store, StoreOptions};
pub use value::DocumentData;
