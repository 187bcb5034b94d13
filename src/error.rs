use std::error::Error;
use std::fmt::{Display, Formatter};

/// Classifies a [`StoreError`]. Rendered on the wire and in assertions as a
/// stable `docstore/...` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// A path, field path, document id or payload failed validation.
    InvalidArgument,
    /// Store options were built without a project id.
    MissingProjectId,
    /// The targeted document does not exist.
    NotFound,
    /// The datastore could not be reached or refused the operation.
    Unavailable,
    /// A reference or query was resolved against the wrong store instance.
    Internal,
}

impl StoreErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreErrorCode::InvalidArgument => "docstore/invalid-argument",
            StoreErrorCode::MissingProjectId => "docstore/missing-project-id",
            StoreErrorCode::NotFound => "docstore/not-found",
            StoreErrorCode::Unavailable => "docstore/unavailable",
            StoreErrorCode::Internal => "docstore/internal",
        }
    }
}

impl Display for StoreErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error surfaced by argument validation or passed through from the
/// datastore.
///
/// The datastore's own failures are forwarded to callers unchanged; the codes
/// above are the only ones this layer produces itself.
#[derive(Clone, Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidArgument, message)
    }

    pub fn missing_project_id() -> Self {
        Self::new(
            StoreErrorCode::MissingProjectId,
            "Store options must include a project_id",
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Internal, message)
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;
