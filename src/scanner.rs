//! Reference scanning - collects every `$ref` string in a schema tree.

use serde_json::Value;

use crate::error::ExtractError;
use crate::types::json_type_name;

/// Collect every `$ref` string in `node`, in document order.
///
/// An object whose `$ref` is a string is terminal: its sibling keys are not
/// visited. Strings are never parsed as nested JSON.
///
/// # Errors
///
/// Returns `ExtractError::UnsupportedNodeType` on numbers and nulls, which a
/// definitions table is not expected to contain.
pub fn find_references(node: &Value) -> Result<Vec<String>, ExtractError> {
    let mut refs = Vec::new();
    collect_references(node, "", &mut refs)?;
    Ok(refs)
}

fn collect_references(node: &Value, path: &str, refs: &mut Vec<String>) -> Result<(), ExtractError> {
    match node {
        Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                refs.push(reference.clone());
                return Ok(());
            }
            for (key, value) in map {
                collect_references(value, &format!("{}/{}", path, key), refs)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_references(item, &format!("{}/{}", path, index), refs)?;
            }
            Ok(())
        }
        Value::Number(_) | Value::Null => Err(ExtractError::UnsupportedNodeType {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            actual: json_type_name(node).to_string(),
        }),
    }
}
