use std::fmt::{Display, Formatter};

use crate::error::{StoreError, StoreResult};

/// A slash-separated location in the document tree.
///
/// Segments alternate collection ids and document ids starting from the root,
/// so an odd number of segments names a collection and an even, non-zero
/// number names a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses a slash-separated path.
    ///
    /// Leading, trailing and doubled slashes are rejected rather than skipped
    /// so a typo cannot silently shift which resource a path names.
    pub fn from_string(raw: &str) -> StoreResult<Self> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in raw.split('/') {
            if segment.is_empty() {
                return Err(StoreError::invalid_argument(format!(
                    "Resource path \"{raw}\" contains an empty segment"
                )));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether this path names a document rather than a collection.
    pub fn is_document_path(&self) -> bool {
        !self.is_empty() && self.len() % 2 == 0
    }

    /// Whether this path names a collection.
    pub fn is_collection_path(&self) -> bool {
        self.len() % 2 == 1
    }

    /// Returns the path extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// The containing path, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn canonical_string(&self) -> String {
        self.segments.join("/")
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render_path() {
        let path = ResourcePath::from_string("cities/sf/neighborhoods/downtown").unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.last_segment(), Some("downtown"));
        assert_eq!(path.canonical_string(), "cities/sf/neighborhoods/downtown");
    }

    #[test]
    fn empty_string_is_the_root() {
        let path = ResourcePath::from_string("").unwrap();
        assert!(path.is_empty());
        assert!(path.parent().is_none());
    }

    #[test]
    fn rejects_empty_segments_anywhere() {
        for raw in ["cities//sf", "/cities/sf", "cities/sf/"] {
            let err = ResourcePath::from_string(raw).unwrap_err();
            assert_eq!(err.code_str(), "docstore/invalid-argument", "path {raw}");
        }
    }

    #[test]
    fn distinguishes_documents_from_collections() {
        let collection = ResourcePath::from_string("cities").unwrap();
        assert!(collection.is_collection_path());
        assert!(!collection.is_document_path());

        let document = collection.child("sf");
        assert!(document.is_document_path());
        assert!(!document.is_collection_path());

        let root = ResourcePath::root();
        assert!(!root.is_document_path());
        assert!(!root.is_collection_path());
    }

    #[test]
    fn child_and_parent_are_inverse() {
        let path = ResourcePath::from_string("cities").unwrap();
        let child = path.child("sf");
        assert_eq!(child.canonical_string(), "cities/sf");
        assert_eq!(child.parent(), Some(path));
    }
}
