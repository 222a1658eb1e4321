//! Raw JSON document parsing
//!
//! A raw file holds a single JSON document that may span many lines. A
//! top-level object is one row; a top-level array is one row per element.

use super::types::Row;
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Parse one raw file into rows
pub fn parse_document(path: &str, body: &[u8]) -> Result<Vec<Row>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let value: JsonValue =
        serde_json::from_slice(body).map_err(|e| Error::malformed(path, e.to_string()))?;

    match value {
        JsonValue::Object(row) => Ok(vec![row]),
        JsonValue::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                JsonValue::Object(row) => Ok(row),
                other => Err(Error::malformed(
                    path,
                    format!("element {i} is not an object: {other}"),
                )),
            })
            .collect(),
        other => Err(Error::malformed(
            path,
            format!("expected an object or array, found {other}"),
        )),
    }
}
