//! Schema adaptation - rewrites third-party schemas into permissive ones for linting.
//!
//! The generic rewrite turns catch-all `patternProperties` maps into
//! `additionalProperties`, which the downstream validator understands. The
//! document-level corrections in [`DocumentPatches`] are applied separately and
//! exactly once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ExtractError;

/// The match-everything key of a catch-all `patternProperties` map.
pub const CATCH_ALL_PATTERN: &str = ".*";

/// Definition holding Kubernetes object metadata (and its `labels` map).
pub const OBJECT_META_DEFINITION: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta";

/// Rewrite `node` into a permissive schema, returning a new tree.
///
/// Applying `adapt` to its own output is a no-op.
pub fn adapt(node: &Value) -> Value {
    match node {
        Value::Object(map) => Value::Object(adapt_object(map)),
        Value::Array(items) => Value::Array(items.iter().map(adapt).collect()),
        other => other.clone(),
    }
}

fn adapt_object(map: &Map<String, Value>) -> Map<String, Value> {
    let mut result: Map<String, Value> = map
        .iter()
        .map(|(key, value)| (key.clone(), adapt(value)))
        .collect();

    let catch_all = match result.get("patternProperties") {
        Some(Value::Object(patterns)) if patterns.len() == 1 => {
            patterns.get(CATCH_ALL_PATTERN).cloned()
        }
        _ => None,
    };

    if let Some(schema) = catch_all {
        result.shift_remove("patternProperties");
        // A nested permissive map adds nothing over accepting anything.
        let additional = if schema.get("additionalProperties").is_some() {
            Value::Bool(true)
        } else {
            schema
        };
        result.insert("additionalProperties".to_string(), additional);
    }

    result
}

/// Targeted corrections applied once to a whole document after [`adapt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentPatches {
    /// Definitions forced to accept arbitrary additional properties.
    #[serde(default)]
    pub permissive_definitions: Vec<String>,
    /// Replacement for an overly strict label-key pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_pattern: Option<LabelPatternPatch>,
}

impl Default for DocumentPatches {
    fn default() -> Self {
        Self {
            permissive_definitions: vec!["Config".to_string()],
            label_pattern: None,
        }
    }
}

/// Overrides `definitions.<definition>.properties.labels.additionalProperties.pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelPatternPatch {
    #[serde(default = "default_label_definition")]
    pub definition: String,
    pub pattern: String,
}

impl LabelPatternPatch {
    /// Patch the `ObjectMeta` label pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            definition: default_label_definition(),
            pattern: pattern.into(),
        }
    }
}

fn default_label_definition() -> String {
    OBJECT_META_DEFINITION.to_string()
}

/// Apply `patches` to `document` in place.
///
/// # Errors
///
/// Returns `ExtractError::PatchTargetMissing` if a patched path does not exist
/// or is not an object.
pub fn apply_patches(document: &mut Value, patches: &DocumentPatches) -> Result<(), ExtractError> {
    for name in &patches.permissive_definitions {
        let target = patch_target(document, &["definitions", name.as_str()])?;
        target.insert("additionalProperties".to_string(), Value::Bool(true));
        debug!(definition = %name, "forced additionalProperties");
    }

    if let Some(patch) = &patches.label_pattern {
        let target = patch_target(
            document,
            &[
                "definitions",
                patch.definition.as_str(),
                "properties",
                "labels",
                "additionalProperties",
            ],
        )?;
        target.insert("pattern".to_string(), Value::String(patch.pattern.clone()));
        debug!(definition = %patch.definition, pattern = %patch.pattern, "patched label pattern");
    }

    Ok(())
}

/// Adapt a whole document and apply its document-level patches.
pub fn build_lint_schema(document: &Value, patches: &DocumentPatches) -> Result<Value, ExtractError> {
    let mut schema = adapt(document);
    apply_patches(&mut schema, patches)?;
    Ok(schema)
}

fn patch_target<'a>(
    document: &'a mut Value,
    tokens: &[&str],
) -> Result<&'a mut Map<String, Value>, ExtractError> {
    let pointer: String = tokens
        .iter()
        .map(|token| format!("/{}", token.replace('~', "~0").replace('/', "~1")))
        .collect();

    document
        .pointer_mut(&pointer)
        .and_then(Value::as_object_mut)
        .ok_or(ExtractError::PatchTargetMissing { pointer })
}
