//! Dotted-field-path data shaping.
//!
//! Given a field path `"a.b.c"` and a value `v`, shaping produces the nested
//! mapping `{"a": {"b": {"c": v}}}`; the nesting depth always equals the
//! number of path segments. Shaping never fails.

use serde_json::Value;

use crate::model::FieldPath;
use crate::value::DocumentData;

/// Nests `data` under each segment of `path` in order.
pub fn shape_value(path: &FieldPath, data: Value) -> DocumentData {
    nest(path.segments(), data)
}

fn nest(segments: &[String], data: Value) -> DocumentData {
    let (first, rest) = segments
        .split_first()
        .expect("FieldPath always has at least one segment");
    let mut map = DocumentData::new();
    if rest.is_empty() {
        map.insert(first.clone(), data);
    } else {
        map.insert(first.clone(), Value::Object(nest(rest, data)));
    }
    map
}

/// Projects `data` onto the requested field paths and merges the shaped
/// results into one mapping.
///
/// The merge is shallow: a later path whose first segment collides with an
/// earlier one replaces the earlier entry wholesale. Paths that resolve to
/// nothing in `data` are shaped around `null`.
pub fn shape_document(data: &DocumentData, paths: &[FieldPath]) -> DocumentData {
    let mut shaped = DocumentData::new();
    for path in paths {
        let value = value_at(data, path).cloned().unwrap_or(Value::Null);
        shaped.extend(shape_value(path, value));
    }
    shaped
}

/// Resolves a dotted field path inside document fields.
pub fn value_at<'a>(data: &'a DocumentData, path: &FieldPath) -> Option<&'a Value> {
    let mut segments = path.segments().iter();
    let mut current = data.get(segments.next()?.as_str())?;
    for segment in segments {
        current = current.as_object()?.get(segment.as_str())?;
    }
    Some(current)
}

/// Writes `value` at the dotted field path, creating intermediate objects as
/// needed and replacing non-object intermediates.
pub fn insert_at(data: &mut DocumentData, path: &FieldPath, value: Value) {
    insert_segments(data, path.segments(), value);
}

fn insert_segments(data: &mut DocumentData, segments: &[String], value: Value) {
    let (first, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return,
    };

    if rest.is_empty() {
        data.insert(first.clone(), value);
        return;
    }

    let entry = data
        .entry(first.clone())
        .or_insert_with(|| Value::Object(DocumentData::new()));
    if !entry.is_object() {
        *entry = Value::Object(DocumentData::new());
    }
    let child = entry
        .as_object_mut()
        .expect("entry was just made an object");
    insert_segments(child, rest, value);
}
