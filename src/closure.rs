//! Reference closure - the minimal set of definitions a root depends on.

use std::collections::VecDeque;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ExtractError;
use crate::scanner::find_references;
use crate::types::definition_name;

/// Definitions reachable from a root, keyed by name in first-discovered order.
pub type ClosureSet = Map<String, Value>;

/// Return the top-level `definitions` table of a schema document.
///
/// # Errors
///
/// Returns `ExtractError::MissingDefinitions` if the document has no
/// `definitions` object.
pub fn definitions_of(document: &Value) -> Result<&Map<String, Value>, ExtractError> {
    document
        .get("definitions")
        .and_then(Value::as_object)
        .ok_or(ExtractError::MissingDefinitions)
}

/// Compute the transitive closure of `root` over `definitions`.
///
/// References are processed breadth-first. A name is inserted the first time
/// it is seen and never extracted again, so cyclic graphs terminate.
///
/// # Errors
///
/// - `ExtractError::UnsupportedReference` for a `$ref` outside `#/definitions/`
/// - `ExtractError::DanglingReference` if the root or a referenced name is missing
/// - `ExtractError::UnsupportedNodeType` if a body contains numbers or nulls
pub fn build_closure(
    definitions: &Map<String, Value>,
    root: &str,
) -> Result<ClosureSet, ExtractError> {
    let root_body = lookup(definitions, root)?;

    let mut closure = ClosureSet::new();
    closure.insert(root.to_string(), root_body.clone());

    let mut queue: VecDeque<String> = find_references(root_body)?.into();

    while let Some(reference) = queue.pop_front() {
        let name = definition_name(&reference)?;
        if closure.contains_key(name) {
            continue;
        }

        let body = lookup(definitions, name)?;
        trace!(root, definition = name, "adding to closure");
        queue.extend(find_references(body)?);
        closure.insert(name.to_string(), body.clone());
    }

    Ok(closure)
}

fn lookup<'a>(definitions: &'a Map<String, Value>, name: &str) -> Result<&'a Value, ExtractError> {
    definitions
        .get(name)
        .ok_or_else(|| ExtractError::DanglingReference {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn pod_pulls_in_podspec() {
        let definitions = table(json!({
            "Pod": { "properties": { "spec": { "$ref": "#/definitions/PodSpec" } } },
            "PodSpec": { "properties": { "containers": { "type": "array" } } },
            "Service": { "properties": { "type": { "type": "string" } } }
        }));

        let closure = build_closure(&definitions, "Pod").unwrap();
        let names: Vec<&str> = closure.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Pod", "PodSpec"]);
        assert_eq!(closure["PodSpec"], definitions["PodSpec"]);
    }

    #[test]
    fn mutual_cycle_terminates() {
        let definitions = table(json!({
            "A": { "properties": { "b": { "$ref": "#/definitions/B" } } },
            "B": { "properties": { "a": { "$ref": "#/definitions/A" } } }
        }));

        let closure = build_closure(&definitions, "A").unwrap();
        assert_eq!(closure.len(), 2);
        assert!(closure.contains_key("A"));
        assert!(closure.contains_key("B"));
    }

    #[test]
    fn self_reference_terminates() {
        let definitions = table(json!({
            "JSONSchemaProps": {
                "properties": {
                    "not": { "$ref": "#/definitions/JSONSchemaProps" },
                    "items": { "$ref": "#/definitions/JSONSchemaProps" }
                }
            }
        }));

        let closure = build_closure(&definitions, "JSONSchemaProps").unwrap();
        assert_eq!(closure.len(), 1);
    }

    #[test]
    fn first_discovered_order() {
        let definitions = table(json!({
            "Z": {},
            "Y": { "properties": { "z": { "$ref": "#/definitions/Z" } } },
            "Root": {
                "properties": {
                    "y": { "$ref": "#/definitions/Y" },
                    "x": { "$ref": "#/definitions/X" }
                }
            },
            "X": { "properties": { "z": { "$ref": "#/definitions/Z" } } }
        }));

        let closure = build_closure(&definitions, "Root").unwrap();
        let names: Vec<&str> = closure.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Root", "Y", "X", "Z"]);
    }

    #[test]
    fn unsupported_reference() {
        let definitions = table(json!({
            "Root": { "properties": { "foo": { "$ref": "#/components/schemas/Foo" } } }
        }));

        let result = build_closure(&definitions, "Root");
        assert!(matches!(
            result,
            Err(ExtractError::UnsupportedReference { reference }) if reference == "#/components/schemas/Foo"
        ));
    }

    #[test]
    fn dangling_reference() {
        let definitions = table(json!({
            "Root": { "properties": { "foo": { "$ref": "#/definitions/Missing" } } }
        }));

        let result = build_closure(&definitions, "Root");
        assert!(matches!(
            result,
            Err(ExtractError::DanglingReference { name }) if name == "Missing"
        ));
    }

    #[test]
    fn missing_root_is_dangling() {
        let definitions = table(json!({ "Pod": {} }));
        let result = build_closure(&definitions, "Deployment");
        assert!(matches!(result, Err(ExtractError::DanglingReference { .. })));
    }

    #[test]
    fn closure_is_idempotent() {
        let definitions = table(json!({
            "Pod": {
                "properties": {
                    "metadata": { "$ref": "#/definitions/ObjectMeta" },
                    "spec": { "$ref": "#/definitions/PodSpec" }
                }
            },
            "PodSpec": { "properties": { "owner": { "$ref": "#/definitions/Pod" } } },
            "ObjectMeta": { "properties": { "name": { "type": "string" } } }
        }));

        let first = serde_json::to_vec(&build_closure(&definitions, "Pod").unwrap()).unwrap();
        let second = serde_json::to_vec(&build_closure(&definitions, "Pod").unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn definitions_of_document() {
        let document = json!({ "swagger": "2.0", "definitions": { "Pod": {} } });
        assert!(definitions_of(&document).unwrap().contains_key("Pod"));

        let bare = json!({ "swagger": "2.0" });
        let result = definitions_of(&bare);
        assert!(matches!(result, Err(ExtractError::MissingDefinitions)));
    }
}
