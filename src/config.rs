//! Driver configuration: which documents to process and where results go.
//!
//! The built-in defaults reproduce the stock source set (Kubernetes API
//! definitions 1.10 through 1.18 plus the Concourse pipeline schema). A JSON
//! file with the same shape replaces them wholesale.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::adapter::DocumentPatches;
use crate::error::{ExtractError, FetchError};

/// Kubernetes releases whose API definitions are extracted by default.
pub const KUBERNETES_VERSIONS: &[&str] = &[
    "1.10.0", "1.11.0", "1.12.0", "1.13.0", "1.14.0", "1.15.0", "1.16.0", "1.17.0", "1.18.0",
];

const KUBERNETES_SWAGGER_URL: &str =
    "https://raw.githubusercontent.com/kubernetes/kubernetes/v{version}/api/openapi-spec/swagger.json";

const CONCOURSE_SCHEMA_URL: &str = "https://raw.githubusercontent.com/cappyzawa/concourse-pipeline-jsonschema/0961a7b3d34fa3c6af28e0b3e93ef25fcf10c417/concourse_jsonschema.json";

/// Which parts of the configuration a run processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SourceSet {
    /// Per-type bundles from every configured source document.
    #[default]
    #[value(name = "k8s")]
    Kubernetes,
    /// Only the adapted lint schema.
    Lint,
    /// Both.
    All,
}

impl SourceSet {
    pub fn includes_sources(self) -> bool {
        matches!(self, SourceSet::Kubernetes | SourceSet::All)
    }

    pub fn includes_lint(self) -> bool {
        matches!(self, SourceSet::Lint | SourceSet::All)
    }
}

/// A monolithic definitions document to split into bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDocument {
    /// Label used in logs (e.g. `k8s-1.18.0`).
    pub name: String,
    /// URL or file path of the document.
    pub locator: String,
    /// Cache file name, relative to the cache directory.
    pub cache_file: PathBuf,
    /// Output subtree, relative to the output directory.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl SourceDocument {
    /// Upstream swagger definitions of a Kubernetes release.
    pub fn kubernetes(version: &str) -> Self {
        Self {
            name: format!("k8s-{}", version),
            locator: KUBERNETES_SWAGGER_URL.replace("{version}", version),
            cache_file: PathBuf::from(format!("k8s-{}-swagger.json", version)),
            namespace: default_namespace(),
        }
    }
}

fn default_namespace() -> String {
    "k8s".to_string()
}

/// A whole third-party schema adapted into a permissive lint schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintSchemaSource {
    pub locator: String,
    pub cache_file: PathBuf,
    /// Output file, relative to the output directory.
    pub output: PathBuf,
    #[serde(default)]
    pub patches: DocumentPatches,
}

impl LintSchemaSource {
    pub fn concourse() -> Self {
        Self {
            locator: CONCOURSE_SCHEMA_URL.to_string(),
            cache_file: PathBuf::from("concourse-jsonschema.json"),
            output: PathBuf::from("builtin/concourse.json"),
            patches: DocumentPatches::default(),
        }
    }
}

/// Everything the driver needs for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub sources: Vec<SourceDocument>,
    #[serde(default)]
    pub lint_schema: Option<LintSchemaSource>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("schema")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            sources: KUBERNETES_VERSIONS
                .iter()
                .map(|version| SourceDocument::kubernetes(version))
                .collect(),
            lint_schema: Some(LintSchemaSource::concourse()),
        }
    }
}

impl DriverConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` if the file cannot be read, or
    /// `ExtractError::InvalidConfig` if it does not match the expected shape.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        if !path.exists() {
            return Err(FetchError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|source| FetchError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ExtractError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn cache_path(&self, cache_file: &Path) -> PathBuf {
        self.cache_dir.join(cache_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_sources() {
        let config = DriverConfig::default();
        assert_eq!(config.sources.len(), KUBERNETES_VERSIONS.len());
        assert_eq!(config.output_dir, Path::new("schema"));

        let first = &config.sources[0];
        assert_eq!(first.name, "k8s-1.10.0");
        assert_eq!(
            first.locator,
            "https://raw.githubusercontent.com/kubernetes/kubernetes/v1.10.0/api/openapi-spec/swagger.json"
        );
        assert_eq!(first.namespace, "k8s");
        assert_eq!(
            config.cache_path(&first.cache_file),
            Path::new("cache/k8s-1.10.0-swagger.json")
        );

        let lint = config.lint_schema.unwrap();
        assert_eq!(lint.patches.permissive_definitions, vec!["Config"]);
    }

    #[test]
    fn source_set_selection() {
        assert!(SourceSet::Kubernetes.includes_sources());
        assert!(!SourceSet::Kubernetes.includes_lint());
        assert!(SourceSet::Lint.includes_lint());
        assert!(!SourceSet::Lint.includes_sources());
        assert!(SourceSet::All.includes_sources() && SourceSet::All.includes_lint());
    }

    #[test]
    fn load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "output_dir": "out",
                "sources": [
                    {{ "name": "local", "locator": "swagger.json", "cache_file": "local.json" }}
                ],
                "lint_schema": {{
                    "locator": "pipeline.json",
                    "cache_file": "pipeline.json",
                    "output": "builtin/pipeline.json",
                    "patches": {{
                        "permissive_definitions": ["Config"],
                        "label_pattern": {{ "pattern": "^.*$" }}
                    }}
                }}
            }}"#
        )
        .unwrap();

        let config = DriverConfig::load(file.path()).unwrap();
        assert_eq!(config.output_dir, Path::new("out"));
        assert_eq!(config.cache_dir, Path::new("cache"));
        assert_eq!(config.sources[0].namespace, "k8s");

        let patch = config.lint_schema.unwrap().patches.label_pattern.unwrap();
        assert_eq!(patch.definition, crate::adapter::OBJECT_META_DEFINITION);
    }

    #[test]
    fn load_config_rejects_unknown_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "outputs": "x" }}"#).unwrap();

        let result = DriverConfig::load(file.path());
        assert!(matches!(result, Err(ExtractError::InvalidConfig { .. })));
    }

    #[test]
    fn load_config_missing_file() {
        let result = DriverConfig::load(Path::new("/nonexistent/config.json"));
        assert!(matches!(
            result,
            Err(ExtractError::Fetch(FetchError::FileNotFound { .. }))
        ));
    }
}
