//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    config::ConfigCommands,
    import::ImportCommands,
    init::InitArgs,
    mat::MatCommands,
    quot::QuotCommands,
    report::ReportCommands,
    res::ResCommands,
    rfq::RfqCommands,
    ven::VenCommands,
};

#[derive(Parser)]
#[command(name = "fqt")]
#[command(author, version, about = "Fabriq Quoting Toolkit")]
#[command(
    long_about = "A Unix-style toolkit for managing manufacturing quotations, cost roll-ups and material price estimates as plain text files under git version control."
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

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .fqt/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new FQT project
    Init(InitArgs),

    /// Quotation management (lines, tiers, pricing)
    #[command(subcommand)]
    Quot(QuotCommands),

    /// Material management (yield, volatility, price history)
    #[command(subcommand)]
    Mat(MatCommands),

    /// Resource management (work centres and hourly rates)
    #[command(subcommand)]
    Res(ResCommands),

    /// Vendor management (subcontract and material vendors)
    #[command(subcommand)]
    Ven(VenCommands),

    /// RFQ management (customer enquiries and quick estimates)
    #[command(subcommand)]
    Rfq(RfqCommands),

    /// Bulk imports (price history from CSV)
    #[command(subcommand)]
    Import(ImportCommands),

    /// Generate quoting reports (cost breakdown, price history)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Show or inspect configuration
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
