//! Schema Bundle CLI
//!
//! Command-line interface for extracting, adapting and checking schema bundles.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schema_bundle::{
    build_closure, build_lint_schema, definitions_of, load_document, validate_manifest, Bundle,
    DefaultFetcher, DocumentPatches, Driver, DriverConfig, FsSink, LabelPatternPatch, MemorySink,
    SourceSet, ValidateError, OBJECT_META_DEFINITION,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "schema-bundle")]
#[command(about = "Extract self-contained JSON Schema bundles from definition sets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the configured sources and write per-type bundles
    Extract {
        /// Which part of the configuration to process
        #[arg(long, value_enum, default_value_t = SourceSet::Kubernetes)]
        set: SourceSet,

        /// JSON config file (default: built-in Kubernetes and Concourse sources)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (overrides the config)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Download cache directory (overrides the config)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Replacement regex for the ObjectMeta label pattern in the lint schema
        #[arg(long)]
        label_pattern: Option<String>,

        /// List the files that would be written without writing them (the download cache is still filled)
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the bundle of one definition
    Closure {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Name of the root definition
        root: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print a schema rewritten into a permissive lint schema
    Adapt {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Definition forced to allow additional properties (repeatable, default: Config)
        #[arg(long = "permissive")]
        permissive: Vec<String>,

        /// Replacement regex for the label pattern
        #[arg(long)]
        label_pattern: Option<String>,

        /// Definition whose label pattern is replaced
        #[arg(long, default_value = OBJECT_META_DEFINITION)]
        label_definition: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a JSON manifest against its extracted bundle
    Validate {
        /// Manifest file
        manifest: PathBuf,

        /// Directory containing extracted schemas (repeatable, first match wins)
        #[arg(long = "schema-path", required = true)]
        schema_paths: Vec<PathBuf>,

        /// Subtree below each schema path
        #[arg(long, default_value = "k8s")]
        namespace: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,schema_bundle=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            set,
            config,
            output_dir,
            cache_dir,
            label_pattern,
            dry_run,
        } => run_extract(ExtractArgs {
            set,
            config,
            output_dir,
            cache_dir,
            label_pattern,
            dry_run,
        }),

        Commands::Closure {
            schema,
            root,
            output,
            pretty,
        } => run_closure(&schema, &root, output, pretty),

        Commands::Adapt {
            schema,
            permissive,
            label_pattern,
            label_definition,
            output,
        } => {
            let patches = DocumentPatches {
                permissive_definitions: if permissive.is_empty() {
                    DocumentPatches::default().permissive_definitions
                } else {
                    permissive
                },
                label_pattern: label_pattern.map(|pattern| LabelPatternPatch {
                    definition: label_definition,
                    pattern,
                }),
            };
            run_adapt(&schema, &patches, output)
        }

        Commands::Validate {
            manifest,
            schema_paths,
            namespace,
            json,
        } => run_validate(&manifest, &schema_paths, &namespace, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct ExtractArgs {
    set: SourceSet,
    config: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    label_pattern: Option<String>,
    dry_run: bool,
}

fn run_extract(args: ExtractArgs) -> Result<(), u8> {
    let mut config = match &args.config {
        Some(path) => DriverConfig::load(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
        None => DriverConfig::default(),
    };

    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(dir) = args.cache_dir {
        config.cache_dir = dir;
    }
    if let Some(pattern) = args.label_pattern {
        match config.lint_schema.as_mut() {
            Some(lint) if args.set.includes_lint() => {
                lint.patches.label_pattern = Some(LabelPatternPatch::new(pattern));
            }
            Some(_) => tracing::warn!(
                set = ?args.set,
                "--label-pattern ignored: the selected set does not build the lint schema"
            ),
            None => tracing::warn!("--label-pattern ignored: no lint_schema is configured"),
        }
    }

    let report = |e: schema_bundle::ExtractError| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    };

    if args.dry_run {
        let mut driver = Driver::new(config, DefaultFetcher, MemorySink::new());
        driver.run(args.set).map_err(report)?;
        for path in driver.into_sink().files.keys() {
            println!("{}", path.display());
        }
    } else {
        let mut driver = Driver::new(config, DefaultFetcher, FsSink);
        let summary = driver.run(args.set).map_err(report)?;
        for path in summary.bundles.iter().chain(summary.lint_schema.iter()) {
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn run_closure(schema_source: &str, root: &str, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let document = load_document(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let bundle = definitions_of(&document)
        .and_then(|definitions| build_closure(definitions, root))
        .map(|closure| Bundle::new(root, closure))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&bundle)
    } else {
        serde_json::to_string(&bundle)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    write_output(output, &json_output)
}

fn run_adapt(schema_source: &str, patches: &DocumentPatches, output: Option<PathBuf>) -> Result<(), u8> {
    let document = load_document(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let schema = build_lint_schema(&document, patches).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let json_output = serde_json::to_string_pretty(&schema).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    write_output(output, &json_output)
}

fn write_output(output: Option<PathBuf>, json_output: &str) -> Result<(), u8> {
    match output {
        Some(path) => {
            std::fs::write(&path, json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }
    Ok(())
}

fn run_validate(
    manifest_path: &std::path::Path,
    schema_paths: &[PathBuf],
    namespace: &str,
    json_output: bool,
) -> Result<(), u8> {
    let manifest: Value = load_document(&manifest_path.to_string_lossy()).map_err(|e| {
        report_error(json_output, &format!("loading manifest: {}", e));
        e.exit_code() as u8
    })?;

    match validate_manifest(&manifest, schema_paths, namespace) {
        Ok(schema) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": true,
                    "schema": schema.display().to_string()
                });
                println!("{}", output);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
