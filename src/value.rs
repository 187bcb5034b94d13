use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// The decoded fields of a document.
pub type DocumentData = serde_json::Map<String, Value>;

/// Serializes a typed model into document fields.
///
/// The model must serialize to a JSON object; scalars, arrays and null are
/// rejected because a document body is always a field map.
pub fn to_document_data<T>(value: &T) -> StoreResult<DocumentData>
where
    T: Serialize,
{
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::invalid_argument(format!(
            "Document payloads must serialize to a JSON object, got {other}"
        ))),
        Err(err) => Err(StoreError::invalid_argument(err.to_string())),
    }
}

/// Decodes document fields into a typed model.
pub fn from_document_data<T>(data: &DocumentData) -> StoreResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(Value::Object(data.clone()))
        .map_err(|err| StoreError::invalid_argument(err.to_string()))
}
