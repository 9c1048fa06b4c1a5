//! JSONPath extraction

use serde_json::{Map, Value};
use serde_json_path::JsonPath;

use crate::version::error::ExtractError;

/// Evaluate `path` against `content` and stringify the first node.
///
/// Strings are returned verbatim, other nodes as compact JSON. Empty results
/// count as no match.
pub fn extract_json(content: &str, path: &str) -> Result<Option<String>, ExtractError> {
    let document = parse_document(content)?;
    let query = JsonPath::parse(&rooted(path))
        .map_err(|e| ExtractError::InvalidJsonPath(e.to_string()))?;

    let text = query.query(&document).first().map(|node| match node {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    });

    Ok(text.filter(|t| !t.is_empty()))
}

/// Documents are usually objects, but some endpoints answer with a bare array
fn parse_document(content: &str) -> Result<Value, ExtractError> {
    match serde_json::from_str::<Map<String, Value>>(content) {
        Ok(object) => Ok(Value::Object(object)),
        Err(_) => Ok(Value::Array(serde_json::from_str::<Vec<Value>>(content)?)),
    }
}

/// Manifests often omit the root selector (`tag_name`, `[0].version`)
fn rooted(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('$') {
        path.to_string()
    } else if path.starts_with('[') {
        format!("${path}")
    } else {
        format!("$.{path}")
    }
}
