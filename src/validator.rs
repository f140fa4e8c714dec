//! Manifest validation against emitted bundles.
//!
//! A manifest's `apiVersion` and `kind` select a bundle at
//! `<search path>/<namespace>/<group-or-core>/<version>/<kind>.json`; the first
//! search path containing one wins.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{SchemaError, ValidateError};
use crate::loader::{DefaultFetcher, Fetcher};
use crate::types::GroupVersionKind;

/// Read the GVK a manifest declares through `apiVersion` and `kind`.
pub fn manifest_gvk(manifest: &Value) -> Result<GroupVersionKind, ValidateError> {
    let field = |name: &str| {
        manifest
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidateError::InvalidManifest {
                message: format!("missing or non-string \"{}\"", name),
            })
    };

    let api_version = field("apiVersion")?;
    let kind = field("kind")?;
    let gvk = GroupVersionKind::from_api_version(api_version, kind);

    // Each part becomes one path component below the search path.
    for (name, segment) in [("group", &gvk.group), ("version", &gvk.version), ("kind", &gvk.kind)] {
        if name != "group" || !segment.is_empty() {
            check_path_segment(name, segment)?;
        }
    }
    Ok(gvk)
}

fn check_path_segment(name: &str, segment: &str) -> Result<(), ValidateError> {
    let unsafe_segment = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if unsafe_segment {
        return Err(ValidateError::InvalidManifest {
            message: format!("{} \"{}\" is not a valid path segment", name, segment),
        });
    }
    Ok(())
}

/// Find the bundle for `gvk` on the search path.
pub fn locate_bundle(
    search_paths: &[PathBuf],
    namespace: &str,
    gvk: &GroupVersionKind,
) -> Result<PathBuf, ValidateError> {
    let relative = Path::new(namespace).join(gvk.relative_path());

    search_paths
        .iter()
        .map(|dir| dir.join(&relative))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ValidateError::SchemaNotFound {
            group: gvk.normalized_group().to_string(),
            version: gvk.version.clone(),
            kind: gvk.kind.to_lowercase(),
            searched: search_paths.to_vec(),
        })
}

/// Validate a manifest against an already-loaded schema.
pub fn validate_against_schema(schema: &Value, manifest: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(manifest)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

/// Locate the bundle for a manifest and validate the manifest against it.
pub fn validate_manifest(
    manifest: &Value,
    search_paths: &[PathBuf],
    namespace: &str,
) -> Result<PathBuf, ValidateError> {
    let gvk = manifest_gvk(manifest)?;
    let path = locate_bundle(search_paths, namespace, &gvk)?;
    debug!(%gvk, schema = %path.display(), "validating manifest");

    let bytes = DefaultFetcher.fetch(&path.to_string_lossy())?;
    let schema: Value =
        serde_json::from_slice(&bytes).map_err(|source| ValidateError::InvalidJson { source })?;

    validate_against_schema(&schema, manifest)?;
    Ok(path)
}
