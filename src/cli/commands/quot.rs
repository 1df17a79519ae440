//! `fqt quot` command - Quotation management

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::cli::helpers::{escape_csv, format_money, format_short_id, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Status;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::Config;
use crate::costing::{roll_up, RollupInputs, RollupResult};
use crate::entities::quotation::{
    MaterialCategory, MaterialLine, QuantityTier, Quotation, RoutingLine, SubconLine,
};
use crate::entities::resource::Resource;

#[derive(Subcommand, Debug)]
pub enum QuotCommands {
    /// List quotations with filtering
    List(ListArgs),

    /// Create a new quotation
    New(NewArgs),

    /// Show a quotation's details
    Show(ShowArgs),

    /// Edit a quotation in your editor
    Edit(EditArgs),

    /// Add a material line
    AddMat(AddMatArgs),

    /// Add a routing operation
    AddOp(AddOpArgs),

    /// Add a subcontract line
    AddSub(AddSubArgs),

    /// Compute volume pricing for every tier
    Price(PriceArgs),

    /// Reprice and release the quotation as a frozen snapshot
    Finalize(FinalizeArgs),
}

/// Entity status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Draft,
    Review,
    Approved,
    Released,
    Obsolete,
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by entity status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Filter by customer (substring match)
    #[arg(long, short = 'c')]
    pub customer: Option<String>,

    /// Search in part number and title
    #[arg(long)]
    pub search: Option<String>,

    /// Filter by author (substring match)
    #[arg(long)]
    pub author: Option<String>,

    /// Show quotations created in last N days
    #[arg(long)]
    pub recent: Option<u32>,

    /// Sort by field
    #[arg(long, default_value = "created")]
    pub sort: SortField,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Id,
    Part,
    Title,
    Customer,
    Status,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Part number being quoted - REQUIRED
    #[arg(long, short = 'p')]
    pub part: String,

    /// Quotation title
    #[arg(long, short = 'T')]
    pub title: Option<String>,

    /// Customer name
    #[arg(long, short = 'c')]
    pub customer: Option<String>,

    /// Quantity tiers as QTY:MARGIN pairs (e.g., --tiers "100:40,500:35,1000:30")
    #[arg(long, short = 't', value_delimiter = ',')]
    pub tiers: Vec<String>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Skip opening in editor
    #[arg(long, short = 'n')]
    pub no_edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Quotation ID (or unique ID fragment)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Quotation ID (or unique ID fragment)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AddMatArgs {
    /// Quotation ID (or unique ID fragment)
    pub id: String,

    /// Line description
    #[arg(long, short = 'd')]
    pub description: String,

    /// Cost per unit of material, markup-free
    #[arg(long, short = 'c')]
    pub cost: Decimal,

    /// Units of material consumed per finished part
    #[arg(long, short = 'Q', default_value = "1")]
    pub qty_per_unit: Decimal,

    /// Line category (raw, hardware, consumable)
    #[arg(long, default_value = "raw")]
    pub category: MaterialCategory,

    /// Material entity reference (MAT-...)
    #[arg(long, short = 'm')]
    pub material: Option<String>,

    /// Vendor entity reference (VEN-...)
    #[arg(long)]
    pub vendor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AddOpArgs {
    /// Quotation ID (or unique ID fragment)
    pub id: String,

    /// Operation number (10, 20, 30, ...)
    #[arg(long, short = 'o')]
    pub op: u32,

    /// Resource entity reference (RES-...)
    #[arg(long, short = 'R')]
    pub resource: Option<String>,

    /// One-time setup minutes per batch
    #[arg(long, short = 's')]
    pub setup: Decimal,

    /// Run minutes per part
    #[arg(long, short = 'u')]
    pub run: Decimal,
}

#[derive(clap::Args, Debug)]
pub struct AddSubArgs {
    /// Quotation ID (or unique ID fragment)
    pub id: String,

    /// Process description
    #[arg(long, short = 'P')]
    pub process: String,

    /// Cost per part at this quantity, markup-free
    #[arg(long, short = 'c')]
    pub cost: Decimal,

    /// The tier quantity this row prices
    #[arg(long, short = 'Q')]
    pub qty: u32,

    /// Vendor entity reference (VEN-...)
    #[arg(long)]
    pub vendor: Option<String>,

    /// Certificate of conformity required
    #[arg(long)]
    pub cert: bool,
}

#[derive(clap::Args, Debug)]
pub struct PriceArgs {
    /// Quotation ID (or unique ID fragment)
    pub id: String,

    /// Compute and print without persisting the result
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct FinalizeArgs {
    /// Quotation ID (or unique ID fragment)
    pub id: String,
}

/// Parse a tier pair (QTY:MARGIN)
fn parse_tier_spec(input: &str) -> Result<QuantityTier> {
    let (qty_str, margin_str) = input.split_once(':').ok_or_else(|| {
        miette::miette!(
            "Invalid tier format '{}'. Expected QTY:MARGIN (e.g., 500:35)",
            input
        )
    })?;

    let quantity: u32 = qty_str
        .trim()
        .parse()
        .map_err(|_| miette::miette!("Invalid quantity '{}' in tier", qty_str))?;

    let target_margin_percent: Decimal = margin_str
        .trim()
        .parse()
        .map_err(|_| miette::miette!("Invalid margin '{}' in tier", margin_str))?;

    Ok(QuantityTier {
        quantity,
        target_margin_percent,
    })
}

/// Run a quot subcommand
pub fn run(cmd: QuotCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        QuotCommands::List(args) => run_list(args, global),
        QuotCommands::New(args) => run_new(args),
        QuotCommands::Show(args) => run_show(args, global),
        QuotCommands::Edit(args) => run_edit(args),
        QuotCommands::AddMat(args) => run_add_mat(args),
        QuotCommands::AddOp(args) => run_add_op(args),
        QuotCommands::AddSub(args) => run_add_sub(args),
        QuotCommands::Price(args) => run_price(args, global),
        QuotCommands::Finalize(args) => run_finalize(args),
    }
}

fn quotation_dir(project: &Project) -> std::path::PathBuf {
    project.entity_dir(EntityPrefix::Quot)
}

/// Load a quotation by ID fragment or fail with a helpful message
fn load_quotation(project: &Project, id: &str) -> Result<(std::path::PathBuf, Quotation)> {
    loader::load_entity::<Quotation>(&quotation_dir(project), id)?
        .ok_or_else(|| miette::miette!("No quotation found matching '{}'", id))
}

/// Build the resource-rate table consumed by the roll-up engine
fn load_rate_table(project: &Project) -> Result<HashMap<String, Decimal>> {
    let resources: Vec<Resource> = loader::load_all(&project.entity_dir(EntityPrefix::Res))?;
    Ok(resources
        .into_iter()
        .map(|r| (r.id.to_string(), r.cost_per_hour))
        .collect())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut quotations: Vec<Quotation> = loader::load_all(&quotation_dir(&project))?;

    quotations.retain(|q| match args.status {
        StatusFilter::Draft => q.status == Status::Draft,
        StatusFilter::Review => q.status == Status::Review,
        StatusFilter::Approved => q.status == Status::Approved,
        StatusFilter::Released => q.status == Status::Released,
        StatusFilter::Obsolete => q.status == Status::Obsolete,
        StatusFilter::All => true,
    });
    if let Some(ref customer) = args.customer {
        let needle = customer.to_lowercase();
        quotations.retain(|q| {
            q.customer
                .as_ref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
        });
    }
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        quotations.retain(|q| {
            q.part_number.to_lowercase().contains(&needle)
                || q.title.to_lowercase().contains(&needle)
        });
    }
    if let Some(ref author) = args.author {
        let needle = author.to_lowercase();
        quotations.retain(|q| q.author.to_lowercase().contains(&needle));
    }
    if let Some(days) = args.recent {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days as i64);
        quotations.retain(|q| q.created >= cutoff);
    }

    match args.sort {
        SortField::Id => quotations.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string())),
        SortField::Part => quotations.sort_by(|a, b| a.part_number.cmp(&b.part_number)),
        SortField::Title => quotations.sort_by(|a, b| a.title.cmp(&b.title)),
        SortField::Customer => quotations.sort_by(|a, b| a.customer.cmp(&b.customer)),
        SortField::Status => quotations.sort_by(|a, b| a.status.cmp(&b.status)),
        SortField::Created => quotations.sort_by(|a, b| a.created.cmp(&b.created)),
    }
    if args.reverse {
        quotations.reverse();
    }
    if let Some(limit) = args.limit {
        quotations.truncate(limit);
    }

    if args.count {
        println!("{}", quotations.len());
        return Ok(());
    }

    if quotations.is_empty() {
        println!("No quotations found.");
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&quotations).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&quotations).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("id,part_number,title,customer,tiers,best_price,status");
            for q in &quotations {
                let best_price = q
                    .volume_pricing
                    .iter()
                    .map(|t| t.unit_price)
                    .min()
                    .map(format_money)
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{}",
                    q.id,
                    escape_csv(&q.part_number),
                    escape_csv(&q.title),
                    escape_csv(q.customer.as_deref().unwrap_or("")),
                    q.tiers.len(),
                    best_price,
                    q.status
                );
            }
        }
        OutputFormat::Id => {
            for q in &quotations {
                println!("{}", q.id);
            }
        }
        OutputFormat::Md => {
            println!("| ID | Part | Title | Customer | Tiers | Best Price | Status |");
            println!("|---|---|---|---|---|---|---|");
            for q in &quotations {
                let best_price = q
                    .volume_pricing
                    .iter()
                    .map(|t| t.unit_price)
                    .min()
                    .map(format_money)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "| {} | {} | {} | {} | {} | {} | {} |",
                    format_short_id(&q.id),
                    q.part_number,
                    q.title,
                    q.customer.as_deref().unwrap_or("-"),
                    q.tiers.len(),
                    best_price,
                    q.status
                );
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<17} {:<12} {:<22} {:<15} {:<6} {:<10} {:<10}",
                style("ID").bold(),
                style("PART").bold(),
                style("TITLE").bold(),
                style("CUSTOMER").bold(),
                style("TIERS").bold(),
                style("PRICE").bold(),
                style("STATUS").bold()
            );
            println!("{}", "-".repeat(98));
            for q in &quotations {
                let best_price = q
                    .volume_pricing
                    .iter()
                    .map(|t| t.unit_price)
                    .min()
                    .map(format_money)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<17} {:<12} {:<22} {:<15} {:<6} {:<10} {:<10}",
                    style(format_short_id(&q.id)).cyan(),
                    truncate_str(&q.part_number, 10),
                    truncate_str(&q.title, 20),
                    truncate_str(q.customer.as_deref().unwrap_or("-"), 13),
                    q.tiers.len(),
                    best_price,
                    q.status
                );
            }
            println!();
            println!("{} quotation(s) found.", style(quotations.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let title = args
        .title
        .unwrap_or_else(|| format!("Quotation for {}", args.part));

    let mut quotation = Quotation::new(args.part.as_str(), title, config.author());
    quotation.customer = args.customer;

    for spec in &args.tiers {
        let tier = parse_tier_spec(spec)?;
        quotation.tiers.push(tier);
    }

    let file_path = project.entity_path(EntityPrefix::Quot, &quotation.id);
    loader::save_entity(&file_path, &quotation)?;

    println!(
        "{} Created quotation {}",
        style("✓").green(),
        style(format_short_id(&quotation.id)).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!(
        "   Part: {} | Tiers: {}",
        style(&quotation.part_number).yellow(),
        quotation.tiers.len()
    );

    if args.edit || (!args.no_edit && args.tiers.is_empty()) {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&file_path).into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, quotation) = load_quotation(&project, &args.id)?;

    match global.format {
        OutputFormat::Yaml | OutputFormat::Auto => {
            let content = std::fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
            if global.format == OutputFormat::Yaml {
                return Ok(());
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&quotation).into_diagnostic()?;
            println!("{}", json);
            return Ok(());
        }
        OutputFormat::Id => {
            println!("{}", quotation.id);
            return Ok(());
        }
        _ => {}
    }

    if global.format != OutputFormat::Auto {
        return Ok(());
    }

    // Auto: append a readable pricing summary after the YAML
    if !quotation.volume_pricing.is_empty() {
        println!();
        println!("{}", style("Volume pricing:").bold());
        for t in &quotation.volume_pricing {
            println!(
                "  qty {:>6}: cost/unit {} -> price {} ({}% margin)",
                t.quantity,
                format_money(t.cost_per_unit),
                style(format_money(t.unit_price)).green(),
                t.margin_percent
            );
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (path, quotation) = load_quotation(&project, &args.id)?;

    if !quotation.is_editable() {
        println!(
            "{} Quotation is {}; released quotations are frozen snapshots. Create a new revision instead.",
            style("!").yellow(),
            quotation.status
        );
        return Ok(());
    }

    config.run_editor(&path).into_diagnostic()?;
    Ok(())
}

/// Guard shared by the add-* commands: lines may only change while the
/// quotation is a draft
fn check_editable(quotation: &Quotation) -> Result<()> {
    if !quotation.is_editable() {
        return Err(miette::miette!(
            "Quotation {} is {}; its line items are an immutable snapshot. Create a new revision to change them.",
            quotation.id,
            quotation.status
        ));
    }
    Ok(())
}

fn run_add_mat(args: AddMatArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut quotation) = load_quotation(&project, &args.id)?;
    check_editable(&quotation)?;

    quotation.materials.push(MaterialLine {
        material: args.material,
        description: args.description,
        cost_per_unit: args.cost,
        quantity_per_unit: args.qty_per_unit,
        category: args.category,
        vendor: args.vendor,
    });
    quotation.clear_pricing();
    loader::save_entity(&path, &quotation)?;

    println!(
        "{} Added material line ({} total). Pricing cleared; rerun {}.",
        style("✓").green(),
        quotation.materials.len(),
        style("fqt quot price").yellow()
    );
    Ok(())
}

fn run_add_op(args: AddOpArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut quotation) = load_quotation(&project, &args.id)?;
    check_editable(&quotation)?;

    quotation.routings.push(RoutingLine {
        op_number: args.op,
        resource: args.resource,
        setup_minutes: args.setup,
        run_minutes: args.run,
    });
    quotation.routings.sort_by_key(|r| r.op_number);
    quotation.clear_pricing();
    loader::save_entity(&path, &quotation)?;

    println!(
        "{} Added op {} ({} total). Pricing cleared; rerun {}.",
        style("✓").green(),
        args.op,
        quotation.routings.len(),
        style("fqt quot price").yellow()
    );
    Ok(())
}

fn run_add_sub(args: AddSubArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut quotation) = load_quotation(&project, &args.id)?;
    check_editable(&quotation)?;

    quotation.subcons.push(SubconLine {
        vendor: args.vendor,
        process: args.process,
        cost_per_unit: args.cost,
        quantity: args.qty,
        cert_required: args.cert,
    });
    quotation.clear_pricing();
    loader::save_entity(&path, &quotation)?;

    println!(
        "{} Added subcon line for qty {} ({} total). Pricing cleared; rerun {}.",
        style("✓").green(),
        args.qty,
        quotation.subcons.len(),
        style("fqt quot price").yellow()
    );
    Ok(())
}

/// Price a quotation and print the tier table. Returns the result so
/// finalize can reuse it.
fn price_quotation(
    project: &Project,
    quotation: &Quotation,
) -> Result<RollupResult> {
    let config = Config::load();
    let settings = config.costing_settings();
    let rates = load_rate_table(project)?;

    let inputs = RollupInputs {
        materials: &quotation.materials,
        subcons: &quotation.subcons,
        routings: &quotation.routings,
        tiers: &quotation.tiers,
    };

    let result = roll_up(&inputs, &rates, &settings).map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{:<8} {:>9} {:>12} {:>12} {:>12} {:>12} {:>10} {:>10} {:>7}",
        style("QTY").bold(),
        style("HOURS").bold(),
        style("LABOUR").bold(),
        style("MATERIAL").bold(),
        style("SUBCON").bold(),
        style("TOTAL").bold(),
        style("COST/U").bold(),
        style("PRICE/U").bold(),
        style("MARGIN").bold()
    );
    println!("{}", "-".repeat(100));
    for t in &result.tiers {
        println!(
            "{:<8} {:>9} {:>12} {:>12} {:>12} {:>12} {:>10} {:>10} {:>6}%",
            t.quantity,
            format!("{:.2}", t.hours.round_dp(2)),
            format_money(t.labour_cost),
            format_money(t.material_cost),
            format_money(t.subcon_cost),
            format_money(t.total_cost),
            format_money(t.cost_per_unit),
            style(format_money(t.unit_price)).green(),
            t.margin_percent
        );
    }

    if !result.fallback_ops.is_empty() {
        println!();
        println!(
            "{} Ops {} priced at the fallback rate; their resource rate could not be resolved.",
            style("!").yellow(),
            result
                .fallback_ops
                .iter()
                .map(|op| op.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(result)
}

fn run_price(args: PriceArgs, _global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut quotation) = load_quotation(&project, &args.id)?;

    let result = price_quotation(&project, &quotation)?;

    if args.dry_run {
        println!();
        println!("{} Dry run; nothing persisted.", style("!").yellow());
        return Ok(());
    }

    quotation.set_pricing(result.tiers, result.fallback_ops);
    loader::save_entity(&path, &quotation)?;

    println!();
    println!(
        "{} Volume pricing saved to {}",
        style("✓").green(),
        style(path.display()).dim()
    );
    Ok(())
}

fn run_finalize(args: FinalizeArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut quotation) = load_quotation(&project, &args.id)?;

    if quotation.status == Status::Released {
        println!(
            "{} Quotation is already released.",
            style("!").yellow()
        );
        return Ok(());
    }

    let result = price_quotation(&project, &quotation)?;
    quotation.set_pricing(result.tiers, result.fallback_ops);
    quotation.status = Status::Released;
    loader::save_entity(&path, &quotation)?;

    println!();
    println!(
        "{} Quotation {} released; line items are now frozen.",
        style("✓").green(),
        style(format_short_id(&quotation.id)).cyan()
    );
    Ok(())
}
