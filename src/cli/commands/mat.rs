//! `fqt mat` command - Material management and quick estimates

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, format_short_id, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::Config;
use crate::costing::estimate_material_cost;
use crate::entities::material::{Material, PriceRecord, Volatility};

#[derive(Subcommand, Debug)]
pub enum MatCommands {
    /// List materials with filtering
    #[command(disable_version_flag = true)]
    List(ListArgs),

    /// Create a new material
    New(NewArgs),

    /// Show a material's details
    Show(ShowArgs),

    /// Edit a material in your editor
    Edit(EditArgs),

    /// Record a dated price observation
    AddPrice(AddPriceArgs),

    /// Estimate material cost per part from the price history
    Estimate(EstimateArgs),
}

/// Volatility filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VolatilityFilter {
    Low,
    Medium,
    High,
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by volatility
    #[arg(long, short = 'V', default_value = "all")]
    pub volatility: VolatilityFilter,

    /// Search in title and specification
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Material name (e.g., "EN AW-6082 T6") - REQUIRED
    #[arg(long, short = 'T')]
    pub title: String,

    /// Specification / grade reference
    #[arg(long)]
    pub spec: Option<String>,

    /// Yield in (0, 1]: fraction of bought material surviving into the part
    #[arg(long, short = 'y', default_value = "1.0")]
    pub r#yield: f64,

    /// Annual inflation rate for time-adjusting old prices (e.g., 0.03)
    #[arg(long, default_value = "0.0")]
    pub inflation: f64,

    /// Price volatility (low, medium, high)
    #[arg(long, default_value = "medium")]
    pub volatility: Volatility,

    /// Initial price per kg, dated today
    #[arg(long, short = 'p')]
    pub price: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Material ID (or unique ID fragment)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Material ID (or unique ID fragment)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AddPriceArgs {
    /// Material ID (or unique ID fragment)
    pub id: String,

    /// Price per kilogram - REQUIRED
    #[arg(long, short = 'p')]
    pub price: f64,

    /// Observation date (YYYY-MM-DD, default: today)
    #[arg(long, short = 'd')]
    pub date: Option<NaiveDate>,

    /// Where the price came from (vendor, index, quote ref)
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct EstimateArgs {
    /// Material ID (or unique ID fragment)
    pub id: String,

    /// Net finished-part weight in kilograms - REQUIRED
    #[arg(long, short = 'w')]
    pub weight: f64,

    /// Requested quantity - REQUIRED
    #[arg(long, short = 'Q')]
    pub qty: u32,

    /// Price at the ~80th percentile instead of the expected value
    #[arg(long)]
    pub p80: bool,
}

/// Run a mat subcommand
pub fn run(cmd: MatCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MatCommands::List(args) => run_list(args, global),
        MatCommands::New(args) => run_new(args),
        MatCommands::Show(args) => run_show(args, global),
        MatCommands::Edit(args) => run_edit(args),
        MatCommands::AddPrice(args) => run_add_price(args),
        MatCommands::Estimate(args) => run_estimate(args, global),
    }
}

fn material_dir(project: &Project) -> std::path::PathBuf {
    project.entity_dir(EntityPrefix::Mat)
}

fn load_material(project: &Project, id: &str) -> Result<(std::path::PathBuf, Material)> {
    loader::load_entity::<Material>(&material_dir(project), id)?
        .ok_or_else(|| miette::miette!("No material found matching '{}'", id))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut materials: Vec<Material> = loader::load_all(&material_dir(&project))?;

    materials.retain(|m| match args.volatility {
        VolatilityFilter::Low => m.volatility == Volatility::Low,
        VolatilityFilter::Medium => m.volatility == Volatility::Medium,
        VolatilityFilter::High => m.volatility == Volatility::High,
        VolatilityFilter::All => true,
    });
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        materials.retain(|m| {
            m.title.to_lowercase().contains(&needle)
                || m.specification
                    .as_ref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
        });
    }

    materials.sort_by(|a, b| a.title.cmp(&b.title));
    if let Some(limit) = args.limit {
        materials.truncate(limit);
    }

    if args.count {
        println!("{}", materials.len());
        return Ok(());
    }

    if materials.is_empty() {
        println!("No materials found.");
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&materials).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&materials).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("id,title,yield,volatility,prices,latest_price");
            for m in &materials {
                let latest = m
                    .latest_price()
                    .map(|r| format!("{:.2}", r.price_per_kg))
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{}",
                    m.id,
                    escape_csv(&m.title),
                    m.default_yield,
                    m.volatility,
                    m.price_history.len(),
                    latest
                );
            }
        }
        OutputFormat::Id => {
            for m in &materials {
                println!("{}", m.id);
            }
        }
        OutputFormat::Md => {
            println!("| ID | Title | Yield | Volatility | Prices | Latest |");
            println!("|---|---|---|---|---|---|");
            for m in &materials {
                let latest = m
                    .latest_price()
                    .map(|r| format!("{:.2}", r.price_per_kg))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "| {} | {} | {} | {} | {} | {} |",
                    format_short_id(&m.id),
                    m.title,
                    m.default_yield,
                    m.volatility,
                    m.price_history.len(),
                    latest
                );
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<17} {:<24} {:<7} {:<10} {:<7} {:<10}",
                style("ID").bold(),
                style("TITLE").bold(),
                style("YIELD").bold(),
                style("VOLAT").bold(),
                style("PRICES").bold(),
                style("LATEST").bold()
            );
            println!("{}", "-".repeat(82));
            for m in &materials {
                let latest = m
                    .latest_price()
                    .map(|r| format!("{:.2}", r.price_per_kg))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<17} {:<24} {:<7} {:<10} {:<7} {:<10}",
                    style(format_short_id(&m.id)).cyan(),
                    truncate_str(&m.title, 22),
                    m.default_yield,
                    m.volatility,
                    m.price_history.len(),
                    latest
                );
            }
            println!();
            println!("{} material(s) found.", style(materials.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    if !(args.r#yield > 0.0 && args.r#yield <= 1.0) {
        return Err(miette::miette!(
            "Yield {} is out of range; it must be > 0 and <= 1 (buy weight = net weight / yield)",
            args.r#yield
        ));
    }

    let mut material = Material::new(args.title.as_str(), args.r#yield, config.author());
    material.specification = args.spec;
    material.inflation_rate_per_year = args.inflation;
    material.volatility = args.volatility;

    if let Some(price) = args.price {
        material.add_price_record(PriceRecord {
            record_date: chrono::Utc::now().date_naive(),
            price_per_kg: price,
            source: None,
        });
    }

    let file_path = project.entity_path(EntityPrefix::Mat, &material.id);
    loader::save_entity(&file_path, &material)?;

    println!(
        "{} Created material {}",
        style("✓").green(),
        style(format_short_id(&material.id)).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!(
        "   Yield: {} | Volatility: {} | Price records: {}",
        style(material.default_yield).yellow(),
        material.volatility,
        material.price_history.len()
    );

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, material) = load_material(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&material).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => {
            println!("{}", material.id);
        }
        _ => {
            let content = std::fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (path, _) = load_material(&project, &args.id)?;
    config.run_editor(&path).into_diagnostic()?;
    Ok(())
}

fn run_add_price(args: AddPriceArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut material) = load_material(&project, &args.id)?;

    if args.price <= 0.0 {
        return Err(miette::miette!(
            "Price per kg must be positive (got {})",
            args.price
        ));
    }

    let record_date = args.date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    material.add_price_record(PriceRecord {
        record_date,
        price_per_kg: args.price,
        source: args.source,
    });
    loader::save_entity(&path, &material)?;

    println!(
        "{} Recorded {:.2}/kg on {} for {} ({} records)",
        style("✓").green(),
        args.price,
        record_date,
        style(&material.title).yellow(),
        material.price_history.len()
    );
    Ok(())
}

fn run_estimate(args: EstimateArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (_, material) = load_material(&project, &args.id)?;

    let mut settings = config.costing_settings();
    if args.p80 {
        settings.use_p80 = true;
    }

    let as_of = chrono::Utc::now().date_naive();
    let estimate = estimate_material_cost(&material, args.weight, args.qty, as_of, &settings)
        .map_err(|e| miette::miette!("{}", e))?;

    if global.format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&estimate).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    println!(
        "{} ({} price records, {} volatility)",
        style(&material.title).bold(),
        material.price_history.len(),
        material.volatility
    );
    println!();
    println!("{}", style("Adjusted price per kg:").bold());
    println!(
        "  low {:.2} | likely {:.2} | high {:.2}",
        estimate.pert.low, estimate.pert.most_likely, estimate.pert.high
    );
    println!(
        "  expected {:.2} | std dev {:.3} | p80 {:.2}",
        estimate.pert.expected, estimate.pert.std_dev, estimate.pert.p80
    );
    println!();
    println!(
        "Using {} price: {:.2}/kg",
        if settings.use_p80 { "p80" } else { "expected" },
        estimate.price_per_kg
    );
    println!(
        "Buy weight per part: {:.3} kg (net {:.3} kg / yield {})",
        estimate.buy_weight_per_part_kg, args.weight, material.default_yield
    );
    println!(
        "Raw cost for {} parts: {:.2} + contingency {:.2}",
        args.qty, estimate.raw_material_cost, estimate.contingency
    );
    println!();
    println!(
        "{} Material cost per part: {}",
        style("✓").green(),
        style(format!("{:.2}", estimate.cost_per_part)).green()
    );

    Ok(())
}
