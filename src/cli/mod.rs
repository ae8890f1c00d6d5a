//! tidyset CLI - data quality checks, cleaning and versioning
//!
//! Command-line interface over a [`Workspace`].

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::{config::Config, quality::IssueKind, workspace::Workspace};

mod clean;
mod dataset;
mod history;
mod inspect;

pub use clean::PlanArgs;

/// tidyset - data quality scoring, cleaning and versioning
#[derive(Parser)]
#[command(name = "tidyset")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage root (overrides config and `TIDYSET_ROOT`)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Config file (default: ./tidyset.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level used when `RUST_LOG` is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

/// Output format for structured results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human readable tables.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a CSV, Parquet or JSON Lines file as a dataset
    Upload {
        /// File to upload
        path: PathBuf,
        /// Dataset name (default: the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// List uploaded datasets
    List,
    /// Full quality report of the current data
    Report {
        /// Dataset filename
        filename: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// 100-point quality score of the current data
    Score {
        /// Dataset filename
        filename: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Cleaning suggestions for the current data
    Suggest {
        /// Dataset filename
        filename: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Column statistics of the current data
    Analyze {
        /// Dataset filename
        filename: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Per-column missing share, dtype and health
    Diagnose {
        /// Dataset filename
        filename: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Fix one issue on one column and commit a version
    Apply {
        /// Dataset filename
        filename: String,
        /// Issue to fix (missing_values, duplicates, datatype, outliers)
        issue: IssueKind,
        /// Column to fix (ignored for duplicates)
        #[arg(default_value = crate::quality::ALL_COLUMNS)]
        column: String,
    },
    /// Apply every current suggestion and commit one version
    ApplyAll {
        /// Dataset filename
        filename: String,
    },
    /// Run a custom cleaning plan on numeric columns and commit a version
    Clean {
        /// Dataset filename
        filename: String,
        #[command(flatten)]
        plan: PlanArgs,
    },
    /// List committed versions, newest first
    Versions {
        /// Dataset filename
        filename: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Make an earlier version current again
    Undo {
        /// Dataset filename
        filename: String,
        /// Version position as listed by `versions` (0 = newest)
        index: usize,
    },
    /// Write the current data as CSV
    Download {
        /// Dataset filename
        filename: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare the original upload with the current data
    Compare {
        /// Dataset filename
        filename: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Export analytics and scores as JSON
    Export {
        /// Dataset filename
        filename: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a pandas script reproducing the suggested fixes
    ExportScript {
        /// Dataset filename
        filename: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the tidyset CLI.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (e.g. from tests) is not an error worth reporting.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_workspace(root: Option<PathBuf>, config: Option<&std::path::Path>) -> crate::Result<Workspace> {
    let mut config = Config::load(config)?;
    if let Some(root) = root {
        config.storage.root = root;
    }
    tracing::debug!(?config, "resolved configuration");
    Workspace::from_config(&config)
}

fn execute(cli: Cli) -> crate::Result<()> {
    let ws = open_workspace(cli.root, cli.config.as_deref())?;

    match cli.command {
        Commands::Upload { path, name } => dataset::cmd_upload(&ws, &path, name.as_deref()),
        Commands::List => dataset::cmd_list(&ws),
        Commands::Report { filename, format } => inspect::cmd_report(&ws, &filename, format),
        Commands::Score { filename, format } => inspect::cmd_score(&ws, &filename, format),
        Commands::Suggest { filename, format } => inspect::cmd_suggest(&ws, &filename, format),
        Commands::Analyze { filename, format } => inspect::cmd_analyze(&ws, &filename, format),
        Commands::Diagnose { filename, format } => inspect::cmd_diagnose(&ws, &filename, format),
        Commands::Apply {
            filename,
            issue,
            column,
        } => clean::cmd_apply(&ws, &filename, issue, &column),
        Commands::ApplyAll { filename } => clean::cmd_apply_all(&ws, &filename),
        Commands::Clean { filename, plan } => clean::cmd_clean(&ws, &filename, &plan),
        Commands::Versions { filename, format } => history::cmd_versions(&ws, &filename, format),
        Commands::Undo { filename, index } => history::cmd_undo(&ws, &filename, index),
        Commands::Download { filename, output } => {
            dataset::cmd_download(&ws, &filename, output.as_deref())
        }
        Commands::Compare { filename, format } => inspect::cmd_compare(&ws, &filename, format),
        Commands::Export { filename, output } => {
            dataset::cmd_export(&ws, &filename, output.as_deref())
        }
        Commands::ExportScript { filename, output } => {
            dataset::cmd_export_script(&ws, &filename, output.as_deref())
        }
    }
}

/// Prints `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> crate::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
