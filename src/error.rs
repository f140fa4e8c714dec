//! Error types for schema extraction, fetching and manifest validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while obtaining a source document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot fetch {url}: built without the `remote` feature")]
    RemoteDisabled { url: String },

    #[error("cannot write cache entry {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            FetchError::RemoteDisabled { .. } => 2,
            _ => 3,
        }
    }
}

/// Errors during closure extraction, adaptation and emission.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported node type {actual} at {path}")]
    UnsupportedNodeType { path: String, actual: String },

    #[error("unsupported reference to {reference}: only #/definitions/<name> pointers are resolved")]
    UnsupportedReference { reference: String },

    #[error("dangling reference: definition \"{name}\" does not exist")]
    DanglingReference { name: String },

    #[error("document has no top-level \"definitions\" object")]
    MissingDefinitions,

    #[error("invalid x-kubernetes-group-version-kind on {definition}: {message}")]
    InvalidGvk { definition: String, message: String },

    #[error("patch target not found: {pointer}")]
    PatchTargetMissing { pointer: String },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ExtractError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExtractError::Write { .. } => 3,
            ExtractError::Fetch(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Errors while validating a manifest against an emitted bundle.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("no schema for {group}/{version}/{kind} in: {}", searched.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    SchemaNotFound {
        group: String,
        version: String,
        kind: String,
        searched: Vec<PathBuf>,
    },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Fetch(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
            _ => 2,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
