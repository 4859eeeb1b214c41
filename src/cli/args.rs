//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    checklist::ChecklistArgs, completions::CompletionsArgs, config::ConfigCommands,
    export::ExportArgs, init::InitArgs, stats::StatsArgs, store::StoreCommands,
    validate::ValidateArgs, walk::WalkCommands,
};

#[derive(Parser)]
#[command(name = "dwalk")]
#[command(author, version, about = "Daily store walk inspections")]
#[command(
    long_about = "Record daily store walk inspections against a fixed compliance checklist, \
                  keep them as plain documents, and report compliance and fix rates."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .dwalk/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new walk project
    Init(InitArgs),

    /// Create, list, show, edit and complete walks
    #[command(subcommand)]
    Walk(WalkCommands),

    /// Store reference data
    #[command(subcommand)]
    Store(StoreCommands),

    /// Print the checklist catalog
    Checklist(ChecklistArgs),

    /// Compliance and fix-rate statistics
    Stats(StatsArgs),

    /// Export walks as CSV, one row per checklist answer
    Export(ExportArgs),

    /// Validate stored documents against their schemas
    Validate(ValidateArgs),

    /// Show or edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Replace `Auto` with `fallback`
    pub fn or(self, fallback: OutputFormat) -> OutputFormat {
        match self {
            OutputFormat::Auto => fallback,
            other => other,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <OutputFormat as ValueEnum>::from_str(s, true)
    }
}
