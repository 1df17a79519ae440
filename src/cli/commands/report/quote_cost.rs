//! Quotation cost breakdown report

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::format_money;
use crate::cli::GlobalOpts;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::entities::quotation::Quotation;

use super::write_output;

#[derive(clap::Args, Debug)]
pub struct QuoteArgs {
    /// Quotation ID (or unique ID fragment)
    pub id: String,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: QuoteArgs, _global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let (_, quotation) = loader::load_entity::<Quotation>(
        &project.entity_dir(EntityPrefix::Quot),
        &args.id,
    )?
    .ok_or_else(|| miette::miette!("No quotation found matching '{}'", args.id))?;

    let mut output = String::new();
    output.push_str(&format!("# Quotation: {}\n\n", quotation.title));
    output.push_str(&format!("Quotation ID: {}\n", quotation.id));
    output.push_str(&format!("Part Number: {}\n", quotation.part_number));
    if let Some(ref customer) = quotation.customer {
        output.push_str(&format!("Customer: {}\n", customer));
    }
    output.push_str(&format!("Status: {}\n\n", quotation.status));

    if !quotation.materials.is_empty() {
        output.push_str("## Materials\n\n");
        let mut table = Builder::default();
        table.push_record(["Description", "Cost/Unit", "Qty/Part", "Cost/Part"]);
        for line in &quotation.materials {
            table.push_record([
                line.description.clone(),
                format_money(line.cost_per_unit),
                line.quantity_per_unit.to_string(),
                format_money(line.cost_per_part()),
            ]);
        }
        output.push_str(&table.build().with(Style::markdown()).to_string());
        output.push_str("\n\n");
    }

    if !quotation.routings.is_empty() {
        output.push_str("## Routing\n\n");
        let mut table = Builder::default();
        table.push_record(["Op", "Resource", "Setup (min)", "Run (min/part)"]);
        for line in &quotation.routings {
            table.push_record([
                line.op_number.to_string(),
                line.resource.clone().unwrap_or_else(|| "-".to_string()),
                line.setup_minutes.to_string(),
                line.run_minutes.to_string(),
            ]);
        }
        output.push_str(&table.build().with(Style::markdown()).to_string());
        output.push_str("\n\n");
    }

    if !quotation.subcons.is_empty() {
        output.push_str("## Subcontract\n\n");
        let mut table = Builder::default();
        table.push_record(["Process", "Qty", "Cost/Part", "Cert"]);
        for line in &quotation.subcons {
            table.push_record([
                line.process.clone(),
                line.quantity.to_string(),
                format_money(line.cost_per_unit),
                if line.cert_required { "yes" } else { "no" }.to_string(),
            ]);
        }
        output.push_str(&table.build().with(Style::markdown()).to_string());
        output.push_str("\n\n");
    }

    if quotation.volume_pricing.is_empty() {
        output.push_str("*No volume pricing computed yet. Run `fqt quot price` first.*\n");
    } else {
        output.push_str("## Volume pricing\n\n");
        let mut table = Builder::default();
        table.push_record([
            "Qty", "Hours", "Labour", "Material", "Subcon", "Total", "Cost/Unit", "Price/Unit",
            "Margin %",
        ]);
        for t in &quotation.volume_pricing {
            table.push_record([
                t.quantity.to_string(),
                format!("{:.2}", t.hours.round_dp(2)),
                format_money(t.labour_cost),
                format_money(t.material_cost),
                format_money(t.subcon_cost),
                format_money(t.total_cost),
                format_money(t.cost_per_unit),
                format_money(t.unit_price),
                t.margin_percent.to_string(),
            ]);
        }
        output.push_str(&table.build().with(Style::markdown()).to_string());
        output.push('\n');

        if !quotation.rate_fallback_ops.is_empty() {
            output.push_str(&format!(
                "\n*Ops {} were priced at the fallback labour rate (resource rate unresolved).*\n",
                quotation
                    .rate_fallback_ops
                    .iter()
                    .map(|op| op.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    write_output(&output, args.output)?;
    Ok(())
}
