//! `fqt report` command - Generate quoting reports

mod prices;
mod quote_cost;

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::cli::GlobalOpts;

pub use prices::PricesArgs;
pub use quote_cost::QuoteArgs;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Cost breakdown for a quotation
    Quote(QuoteArgs),

    /// Price history and estimate statistics per material
    Prices(PricesArgs),
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Quote(args) => quote_cost::run(args, global),
        ReportCommands::Prices(args) => prices::run(args, global),
    }
}

// Shared helper functions

pub(crate) fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
