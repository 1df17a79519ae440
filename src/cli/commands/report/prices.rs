//! Material price history and estimate statistics report

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::GlobalOpts;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::costing::estimate_price_per_kg;
use crate::entities::material::Material;

use super::write_output;

#[derive(clap::Args, Debug)]
pub struct PricesArgs {
    /// Limit to one material ID (or unique ID fragment)
    #[arg(long, short = 'm')]
    pub material: Option<String>,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: PricesArgs, _global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let material_dir = project.entity_dir(EntityPrefix::Mat);

    let materials: Vec<Material> = if let Some(ref id) = args.material {
        let (_, material) = loader::load_entity::<Material>(&material_dir, id)?
            .ok_or_else(|| miette::miette!("No material found matching '{}'", id))?;
        vec![material]
    } else {
        let mut all: Vec<Material> = loader::load_all(&material_dir)?;
        all.sort_by(|a, b| a.title.cmp(&b.title));
        all
    };

    if materials.is_empty() {
        println!("No materials found.");
        return Ok(());
    }

    let as_of = chrono::Utc::now().date_naive();

    let mut output = String::new();
    output.push_str("# Material price estimates\n\n");
    output.push_str(&format!("As of: {}\n\n", as_of));

    let mut table = Builder::default();
    table.push_record([
        "Material", "Records", "Low", "Likely", "High", "Expected", "Std Dev", "P80",
    ]);

    let mut without_history: Vec<String> = Vec::new();

    for material in &materials {
        match estimate_price_per_kg(material, as_of) {
            Ok(pert) => {
                table.push_record([
                    material.title.clone(),
                    material.price_history.len().to_string(),
                    format!("{:.2}", pert.low),
                    format!("{:.2}", pert.most_likely),
                    format!("{:.2}", pert.high),
                    format!("{:.2}", pert.expected),
                    format!("{:.3}", pert.std_dev),
                    format!("{:.2}", pert.p80),
                ]);
            }
            Err(_) => without_history.push(material.title.clone()),
        }
    }

    output.push_str(&table.build().with(Style::markdown()).to_string());
    output.push('\n');

    if !without_history.is_empty() {
        output.push_str(&format!(
            "\n*No price history (no estimate available): {}*\n",
            without_history.join(", ")
        ));
    }

    // Per-material history when a single material was requested
    if args.material.is_some() {
        let material = &materials[0];
        if !material.price_history.is_empty() {
            output.push_str("\n## Price history\n\n");
            let mut history = Builder::default();
            history.push_record(["Date", "Price/kg", "Source"]);
            for record in &material.price_history {
                history.push_record([
                    record.record_date.to_string(),
                    format!("{:.2}", record.price_per_kg),
                    record.source.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            output.push_str(&history.build().with(Style::markdown()).to_string());
            output.push('\n');
        }
    }

    write_output(&output, args.output)?;
    Ok(())
}
