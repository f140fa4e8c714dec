//! Batch driver - fetches each configured document and emits its bundles.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::adapter::build_lint_schema;
use crate::bundle::{emit, Sink};
use crate::closure::{build_closure, definitions_of};
use crate::config::{DriverConfig, LintSchemaSource, SourceDocument, SourceSet};
use crate::error::ExtractError;
use crate::loader::{parse_document, CachedFetcher, Fetcher};
use crate::types::GroupVersionKind;

/// What a driver run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sources: usize,
    pub bundles: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lint_schema: Option<PathBuf>,
}

/// Emit a bundle for every GVK-annotated definition of `document` under `base_dir`.
///
/// Definitions are processed in document order; the first error aborts the
/// pass, leaving bundles already written in place.
pub fn extract_document<S: Sink + ?Sized>(
    document: &Value,
    base_dir: &Path,
    sink: &mut S,
) -> Result<Vec<PathBuf>, ExtractError> {
    let definitions = definitions_of(document)?;
    let mut written = Vec::new();

    for (name, body) in definitions {
        let Some(gvks) = GroupVersionKind::from_definition(name, body)? else {
            continue;
        };

        let closure = build_closure(definitions, name)?;
        debug!(root = %name, definitions = closure.len(), "built closure");
        written.extend(emit(name, closure, &gvks, base_dir, sink)?);
    }

    Ok(written)
}

/// Runs extraction over a [`DriverConfig`].
pub struct Driver<F, S> {
    config: DriverConfig,
    fetcher: CachedFetcher<F>,
    sink: S,
}

impl<F: Fetcher, S: Sink> Driver<F, S> {
    pub fn new(config: DriverConfig, fetcher: F, sink: S) -> Self {
        Self {
            config,
            fetcher: CachedFetcher::new(fetcher),
            sink,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Consume the driver, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process the selected part of the configuration.
    ///
    /// Sources are handled one after another; the first failure stops the run.
    pub fn run(&mut self, set: SourceSet) -> Result<RunSummary, ExtractError> {
        let mut summary = RunSummary::default();

        if set.includes_sources() {
            let sources = self.config.sources.clone();
            for source in &sources {
                summary.bundles.extend(self.process_source(source)?);
                summary.sources += 1;
            }
        }

        if set.includes_lint() {
            if let Some(lint) = self.config.lint_schema.clone() {
                summary.lint_schema = Some(self.write_lint_schema(&lint)?);
            }
        }

        info!(
            sources = summary.sources,
            bundles = summary.bundles.len(),
            "extraction finished"
        );
        Ok(summary)
    }

    /// Fetch one source document and emit all of its bundles.
    pub fn process_source(&mut self, source: &SourceDocument) -> Result<Vec<PathBuf>, ExtractError> {
        let cache_path = self.config.cache_path(&source.cache_file);
        let bytes = self.fetcher.fetch(&source.locator, &cache_path)?;
        let document = parse_document(&bytes)?;

        info!(source = %source.name, "extracting schemas");
        let base_dir = self.config.output_dir.join(&source.namespace);
        extract_document(&document, &base_dir, &mut self.sink)
    }

    /// Fetch, adapt and patch the lint schema, then write it pretty-printed.
    pub fn write_lint_schema(&mut self, lint: &LintSchemaSource) -> Result<PathBuf, ExtractError> {
        let cache_path = self.config.cache_path(&lint.cache_file);
        let bytes = self.fetcher.fetch(&lint.locator, &cache_path)?;
        let document = parse_document(&bytes)?;

        let schema = build_lint_schema(&document, &lint.patches)?;
        let output =
            serde_json::to_vec_pretty(&schema).map_err(|source| ExtractError::InvalidJson { source })?;

        let path = self.config.output_dir.join(&lint.output);
        info!(path = %path.display(), "writing lint schema");
        self.sink.write(&path, &output)?;
        Ok(path)
    }
}
