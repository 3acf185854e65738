//! # tipsync-cli
//!
//! Command-line interface for keeping the element help-text catalog in sync
//! with the element registry.
//!
//! `tipsync check` reports drift and fails when live fields have no help
//! text; `tipsync generate` emits the regenerated catalog. Nothing is
//! written back to the catalog file unless `--write` is given.

mod config;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use config::{CheckPolicy, SyncConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tipsync_catalog::{
    Catalog, CatalogFormat, CatalogStore, DriftReporter, KeyOrder, ReportFormat, diff, synchronize,
};
use tipsync_schema::{RegistryLoader, Schema, schema_of};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Exit status for drift that fails the check policy
const EXIT_DRIFT: u8 = 1;
/// Exit status for unreadable or malformed inputs
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "tipsync")]
#[command(about = "Keep element help texts in sync with the element registry")]
#[command(version)]
struct Cli {
    /// Path to configuration file (default: ./tipsync.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every subcommand
#[derive(Args)]
struct SourceArgs {
    /// Catalog file
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Registry definition file (YAML or JSON)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Catalog format (default: from the catalog file extension)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Project setting handed to the element models, as KEY=VALUE
    #[arg(short = 's', long = "setting", value_parser = parse_setting)]
    settings: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report drift; exit with status 1 when live fields lack help text
    Check {
        #[command(flatten)]
        source: SourceArgs,

        /// Also fail on stale entries and blank help texts
        #[arg(long)]
        strict: bool,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportArg::Text)]
        report: ReportArg,
    },

    /// Regenerate the catalog with empty entries for undocumented fields
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the regenerated catalog to this file instead of stdout
        #[arg(short, long, conflicts_with = "write")]
        output: Option<PathBuf>,

        /// Replace the catalog file with the regenerated catalog
        #[arg(long)]
        write: bool,

        /// Sort element types and fields lexicographically
        #[arg(long)]
        sort: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Literal,
    Yaml,
    Json,
}

impl From<FormatArg> for CatalogFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Literal => CatalogFormat::Literal,
            FormatArg::Yaml => CatalogFormat::Yaml,
            FormatArg::Json => CatalogFormat::Json,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportArg {
    Text,
    Json,
}

impl From<ReportArg> for ReportFormat {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Text => ReportFormat::Text,
            ReportArg::Json => ReportFormat::Json,
        }
    }
}

fn parse_setting(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Catalog, schema and store of one run
struct Inputs {
    catalog_path: PathBuf,
    catalog: Catalog,
    schema: Schema,
    store: CatalogStore,
}

fn load_inputs(config: &SyncConfig, source: &SourceArgs) -> Result<Inputs> {
    let catalog_path = source
        .catalog
        .clone()
        .or_else(|| config.catalog.clone())
        .context("no catalog given; pass --catalog or set `catalog` in the configuration")?;
    let registry_path = source
        .registry
        .clone()
        .or_else(|| config.registry.clone())
        .context("no registry given; pass --registry or set `registry` in the configuration")?;

    let mut settings = config.project_settings()?;
    for (key, value) in &source.settings {
        settings.set(key.clone(), value.clone());
    }

    let registry = RegistryLoader::new()
        .load_from_file(&registry_path)
        .with_context(|| format!("failed to load registry {}", registry_path.display()))?;
    let schema = schema_of(&registry, &settings).context("failed to derive the element schema")?;

    let format = catalog_format(config, source, &catalog_path);
    let text = std::fs::read_to_string(&catalog_path)
        .with_context(|| format!("failed to read catalog {}", catalog_path.display()))?;

    let store = CatalogStore::new()
        .with_format(format)
        .with_order(config.ordering);
    let store = match config.indent {
        Some(indent) => store.with_indent(indent),
        None => store,
    };
    let document = store
        .load_document(&text)
        .with_context(|| format!("malformed catalog {}", catalog_path.display()))?;
    let store = store.with_binding(config.binding.clone().or(document.binding));

    info!(
        "Loaded {} element types from the registry and {} from the catalog",
        schema.len(),
        document.catalog.len()
    );

    Ok(Inputs {
        catalog_path,
        catalog: document.catalog,
        schema,
        store,
    })
}

/// `--format` wins. A catalog named on the command line is read by its
/// extension; the configured format only applies to the configured catalog.
fn catalog_format(config: &SyncConfig, source: &SourceArgs, catalog_path: &Path) -> CatalogFormat {
    match (source.format, &source.catalog) {
        (Some(format), _) => format.into(),
        (None, Some(_)) => CatalogFormat::from_path(catalog_path),
        (None, None) => config
            .format
            .unwrap_or_else(|| CatalogFormat::from_path(catalog_path)),
    }
}

fn check(config: &SyncConfig, source: &SourceArgs, strict: bool, report: ReportArg) -> Result<u8> {
    let inputs = load_inputs(config, source)?;
    let drift = diff(&inputs.catalog, &inputs.schema);

    let reporter = DriftReporter::new().with_format(report.into());
    print!("{}", reporter.report(&drift));

    let policy = if strict { CheckPolicy::Strict } else { config.policy };
    if policy.fails(&drift) {
        debug!("Check failed under {:?} policy", policy);
        Ok(EXIT_DRIFT)
    } else {
        Ok(0)
    }
}

fn generate(
    config: &SyncConfig,
    source: &SourceArgs,
    output: Option<PathBuf>,
    write: bool,
    sort: bool,
) -> Result<u8> {
    let inputs = load_inputs(config, source)?;
    let outcome = synchronize(&inputs.catalog, &inputs.schema);

    let store = if sort {
        inputs.store.with_order(KeyOrder::Lexicographic)
    } else {
        inputs.store
    };
    let reporter = DriftReporter::new().with_store(store);
    let report = reporter.report(&outcome.drift);
    let text = reporter
        .emit(&outcome.regenerated)
        .context("failed to render the regenerated catalog")?;

    let target = if write {
        Some(inputs.catalog_path)
    } else {
        output
    };

    match target {
        Some(path) => {
            print!("{report}");
            std::fs::write(&path, text)
                .with_context(|| format!("failed to write catalog {}", path.display()))?;
            if outcome.changes(&inputs.catalog) {
                info!("Wrote regenerated catalog to {}", path.display());
            } else {
                info!("Catalog content unchanged; rewrote {}", path.display());
            }
        }
        None => {
            eprint!("{report}");
            print!("{text}");
        }
    }

    Ok(0)
}

fn run(cli: Cli) -> Result<u8> {
    let config = SyncConfig::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Check {
            source,
            strict,
            report,
        } => check(&config, &source, strict, report),
        Commands::Generate {
            source,
            output,
            write,
            sort,
        } => generate(&config, &source, output, write, sort),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
