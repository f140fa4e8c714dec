//! Schema Bundle Extractor
//!
//! Splits a monolithic JSON Schema definitions document (such as the
//! Kubernetes API `swagger.json`) into self-contained per-type bundles, and
//! adapts third-party schemas into permissive lint schemas.
//!
//! # Example
//!
//! ```
//! use schema_bundle::{build_closure, definitions_of, Bundle};
//! use serde_json::json;
//!
//! let document = json!({
//!     "definitions": {
//!         "Pod": { "properties": { "spec": { "$ref": "#/definitions/PodSpec" } } },
//!         "PodSpec": { "properties": { "containers": { "type": "array" } } },
//!         "Service": { "type": "object" }
//!     }
//! });
//!
//! let definitions = definitions_of(&document).unwrap();
//! let closure = build_closure(definitions, "Pod").unwrap();
//! assert_eq!(closure.len(), 2);
//!
//! let bundle = Bundle::new("Pod", closure);
//! assert_eq!(bundle.root_ref, "#/definitions/Pod");
//! ```
//!
//! # Output Layout
//!
//! | Input | Output |
//! |-------|--------|
//! | Definition with GVK `("", "v1", "Pod")` | `schema/k8s/core/v1/pod.json` |
//! | Definition with GVK `("apps", "v1", "Deployment")` | `schema/k8s/apps/v1/deployment.json` |
//! | Definition without a GVK annotation | nothing (only reachable through references) |
//! | Lint schema source | `schema/builtin/concourse.json` |
//!
//! # Adaptation
//!
//! A catch-all map `{"patternProperties": {".*": S}}` becomes
//! `{"additionalProperties": S}`, and `S` collapses to `true` when it is itself
//! a permissive map.

mod adapter;
mod bundle;
mod closure;
mod config;
mod driver;
mod error;
mod loader;
mod scanner;
mod types;
mod validator;

pub use adapter::{
    adapt, apply_patches, build_lint_schema, DocumentPatches, LabelPatternPatch,
    CATCH_ALL_PATTERN, OBJECT_META_DEFINITION,
};
pub use bundle::{bundle_paths, emit, Bundle, FsSink, MemorySink, Sink};
pub use closure::{build_closure, definitions_of, ClosureSet};
pub use config::{DriverConfig, LintSchemaSource, SourceDocument, SourceSet, KUBERNETES_VERSIONS};
pub use driver::{extract_document, Driver, RunSummary};
pub use error::{ExtractError, FetchError, SchemaError, ValidateError};
pub use loader::{is_url, load_document, parse_document, CachedFetcher, DefaultFetcher, Fetcher};
pub use scanner::find_references;
pub use types::{
    definition_name, definition_ref, json_type_name, GroupVersionKind, CORE_GROUP,
    DEFINITIONS_PREFIX, GVK_EXTENSION,
};
pub use validator::{locate_bundle, manifest_gvk, validate_against_schema, validate_manifest};
