//! `fqt import` command - Bulk imports from CSV

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::entities::material::{Material, PriceRecord};

#[derive(Subcommand, Debug)]
pub enum ImportCommands {
    /// Import price records for a material from CSV
    Prices(PricesArgs),
}

#[derive(clap::Args, Debug)]
pub struct PricesArgs {
    /// Material ID (or unique ID fragment) - REQUIRED
    #[arg(long, short = 'm')]
    pub material: String,

    /// CSV file with columns: date,price_per_kg[,source]
    pub file: PathBuf,
}

/// One CSV row of price history
#[derive(Debug, Deserialize)]
struct PriceRow {
    date: chrono::NaiveDate,
    price_per_kg: f64,
    #[serde(default)]
    source: Option<String>,
}

pub fn run(cmd: ImportCommands) -> Result<()> {
    match cmd {
        ImportCommands::Prices(args) => run_prices(args),
    }
}

fn run_prices(args: PricesArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let material_dir = project.entity_dir(EntityPrefix::Mat);

    let (path, mut material) = loader::load_entity::<Material>(&material_dir, &args.material)?
        .ok_or_else(|| miette::miette!("No material found matching '{}'", args.material))?;

    let mut reader = csv::Reader::from_path(&args.file).into_diagnostic()?;

    let mut imported = 0usize;
    for (line, row) in reader.deserialize::<PriceRow>().enumerate() {
        let row = row.map_err(|e| {
            miette::miette!("row {}: {} (expected date,price_per_kg[,source])", line + 2, e)
        })?;

        if row.price_per_kg <= 0.0 {
            return Err(miette::miette!(
                "row {}: price_per_kg must be positive (got {})",
                line + 2,
                row.price_per_kg
            ));
        }

        material.add_price_record(PriceRecord {
            record_date: row.date,
            price_per_kg: row.price_per_kg,
            source: row.source,
        });
        imported += 1;
    }

    if imported == 0 {
        println!("{} No rows found in {}", style("!").yellow(), args.file.display());
        return Ok(());
    }

    loader::save_entity(&path, &material)?;

    println!(
        "{} Imported {} price record(s) into {} ({} total)",
        style("✓").green(),
        style(imported).cyan(),
        style(&material.title).yellow(),
        material.price_history.len()
    );

    Ok(())
}
