//! Bundle emission - writes a root pointer plus its closure to one file per GVK.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::closure::ClosureSet;
use crate::error::ExtractError;
use crate::types::{definition_ref, GroupVersionKind, DEFINITIONS_PREFIX};

/// A self-contained schema: a pointer to the root definition plus its closure.
///
/// Serializes as `{"$ref": "#/definitions/<root>", "definitions": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "$ref")]
    pub root_ref: String,
    pub definitions: ClosureSet,
}

impl Bundle {
    pub fn new(root: &str, definitions: ClosureSet) -> Self {
        Self {
            root_ref: definition_ref(root),
            definitions,
        }
    }

    /// Name of the root definition.
    pub fn root(&self) -> &str {
        self.root_ref
            .strip_prefix(DEFINITIONS_PREFIX)
            .unwrap_or(&self.root_ref)
    }

    /// Compact UTF-8 JSON encoding, stable across runs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExtractError> {
        serde_json::to_vec(self).map_err(|source| ExtractError::InvalidJson { source })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ExtractError> {
        serde_json::from_slice(bytes).map_err(|source| ExtractError::InvalidJson { source })
    }
}

/// Destination for emitted files.
pub trait Sink {
    /// Write `bytes` to `path`, creating parent directories and overwriting
    /// any existing file.
    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<(), ExtractError>;
}

/// Writes files to the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl Sink for FsSink {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<(), ExtractError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ExtractError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, bytes).map_err(|source| ExtractError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Keeps written files in memory. Used for dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }
}

impl Sink for MemorySink {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<(), ExtractError> {
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}

/// Target paths of a bundle under `base_dir`, one per GVK.
pub fn bundle_paths(base_dir: &Path, gvks: &[GroupVersionKind]) -> Vec<PathBuf> {
    gvks.iter().map(|gvk| base_dir.join(gvk.relative_path())).collect()
}

/// Build the bundle for `root` and write it once per GVK.
///
/// Every target receives the same bytes. Returns the written paths in GVK order.
pub fn emit<S: Sink + ?Sized>(
    root: &str,
    closure: ClosureSet,
    gvks: &[GroupVersionKind],
    base_dir: &Path,
    sink: &mut S,
) -> Result<Vec<PathBuf>, ExtractError> {
    let bytes = Bundle::new(root, closure).to_bytes()?;
    let paths = bundle_paths(base_dir, gvks);

    for path in &paths {
        debug!(root, path = %path.display(), "writing bundle");
        sink.write(path, &bytes)?;
    }

    Ok(paths)
}
