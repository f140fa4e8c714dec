//! Core types shared by extraction, emission and validation.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ExtractError;

/// Prefix every resolvable `$ref` must carry.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Vendor extension listing the GVKs a definition serializes as.
pub const GVK_EXTENSION: &str = "x-kubernetes-group-version-kind";

/// Path segment used in place of the empty (legacy core) API group.
pub const CORE_GROUP: &str = "core";

/// File extension of emitted bundles.
pub const BUNDLE_EXTENSION: &str = "json";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strip the `#/definitions/` prefix from a reference, yielding the definition name.
///
/// # Errors
///
/// Returns `ExtractError::UnsupportedReference` for any other pointer shape.
pub fn definition_name(reference: &str) -> Result<&str, ExtractError> {
    reference
        .strip_prefix(DEFINITIONS_PREFIX)
        .ok_or_else(|| ExtractError::UnsupportedReference {
            reference: reference.to_string(),
        })
}

/// Build the reference pointing at a definition.
pub fn definition_ref(name: &str) -> String {
    format!("{}{}", DEFINITIONS_PREFIX, name)
}

/// A Kubernetes group/version/kind triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Split an `apiVersion` such as `apps/v1` or `v1` and pair it with a kind.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        match api_version.rsplit_once('/') {
            Some((group, version)) => Self::new(group, version, kind),
            None => Self::new("", api_version, kind),
        }
    }

    /// Group with `""` normalized to `core`.
    pub fn normalized_group(&self) -> &str {
        if self.group.is_empty() {
            CORE_GROUP
        } else {
            &self.group
        }
    }

    /// Path of this type's bundle relative to a namespace directory:
    /// `<group-or-core>/<version>/<kind lowercased>.json`.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from(self.normalized_group());
        path.push(&self.version);
        path.push(format!(
            "{}.{}",
            self.kind.to_lowercase(),
            BUNDLE_EXTENSION
        ));
        path
    }

    /// Read the GVK annotation of a definition body.
    ///
    /// Returns `None` when the definition carries no annotation at all, and
    /// `Some` (possibly empty) when it does.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::InvalidGvk` if the annotation is not an array of
    /// `{group, version, kind}` objects.
    pub fn from_definition(name: &str, body: &Value) -> Result<Option<Vec<Self>>, ExtractError> {
        let Some(annotation) = body.get(GVK_EXTENSION) else {
            return Ok(None);
        };

        Vec::<Self>::deserialize(annotation)
            .map(Some)
            .map_err(|e| ExtractError::InvalidGvk {
                definition: name.to_string(),
                message: e.to_string(),
            })
    }
}

impl std::fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.normalized_group(),
            self.version,
            self.kind
        )
    }
}
