use std::fmt::{Display, Formatter};

use crate::error::{StoreError, StoreResult};
use crate::model::ResourcePath;

/// Identifies one document: the path of its collection plus its id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    path: ResourcePath,
}

impl DocumentKey {
    pub fn from_path(path: ResourcePath) -> StoreResult<Self> {
        if !path.is_document_path() {
            return Err(StoreError::invalid_argument(format!(
                "\"{path}\" does not name a document; segments alternate collection and document ids"
            )));
        }
        Ok(Self { path })
    }

    pub fn from_string(raw: &str) -> StoreResult<Self> {
        Self::from_path(ResourcePath::from_string(raw)?)
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The path of the collection this document lives in.
    pub fn collection_path(&self) -> ResourcePath {
        self.path
            .parent()
            .expect("document paths always have a parent collection")
    }

    /// The document id, the last segment of the path.
    pub fn id(&self) -> &str {
        self.path
            .last_segment()
            .expect("document paths are never empty")
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}
