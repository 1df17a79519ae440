//! `fqt rfq` command - Customer enquiries and quick estimates

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, format_short_id, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::Config;
use crate::costing::estimate_material_cost;
use crate::entities::material::Material;
use crate::entities::rfq::{Rfq, RfqPart};

#[derive(Subcommand, Debug)]
pub enum RfqCommands {
    /// List enquiries
    List(ListArgs),

    /// Create a new enquiry
    New(NewArgs),

    /// Show an enquiry's details
    Show(ShowArgs),

    /// Edit an enquiry in your editor
    Edit(EditArgs),

    /// Add a part to an enquiry
    AddPart(AddPartArgs),

    /// Run material estimates for every part on the enquiry
    Estimate(EstimateArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by customer (substring match)
    #[arg(long, short = 'c')]
    pub customer: Option<String>,

    /// Search in title and reference
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Enquiry title - REQUIRED
    #[arg(long, short = 'T')]
    pub title: String,

    /// Customer name - REQUIRED
    #[arg(long, short = 'c')]
    pub customer: String,

    /// Customer's enquiry reference
    #[arg(long)]
    pub reference: Option<String>,

    /// Response due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Enquiry ID (or unique ID fragment)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Enquiry ID (or unique ID fragment)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AddPartArgs {
    /// Enquiry ID (or unique ID fragment)
    pub id: String,

    /// Customer part number - REQUIRED
    #[arg(long, short = 'p')]
    pub part: String,

    /// Part description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Material entity reference (MAT-...)
    #[arg(long, short = 'm')]
    pub material: Option<String>,

    /// Net finished-part weight in kilograms - REQUIRED
    #[arg(long, short = 'w')]
    pub weight: f64,

    /// Quantities to price (e.g., --qty 100 --qty 500)
    #[arg(long, short = 'Q')]
    pub qty: Vec<u32>,
}

#[derive(clap::Args, Debug)]
pub struct EstimateArgs {
    /// Enquiry ID (or unique ID fragment)
    pub id: String,

    /// Price at the ~80th percentile instead of the expected value
    #[arg(long)]
    pub p80: bool,
}

/// Run an rfq subcommand
pub fn run(cmd: RfqCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RfqCommands::List(args) => run_list(args, global),
        RfqCommands::New(args) => run_new(args),
        RfqCommands::Show(args) => run_show(args, global),
        RfqCommands::Edit(args) => run_edit(args),
        RfqCommands::AddPart(args) => run_add_part(args),
        RfqCommands::Estimate(args) => run_estimate(args),
    }
}

fn rfq_dir(project: &Project) -> std::path::PathBuf {
    project.entity_dir(EntityPrefix::Rfq)
}

fn load_rfq(project: &Project, id: &str) -> Result<(std::path::PathBuf, Rfq)> {
    loader::load_entity::<Rfq>(&rfq_dir(project), id)?
        .ok_or_else(|| miette::miette!("No enquiry found matching '{}'", id))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut rfqs: Vec<Rfq> = loader::load_all(&rfq_dir(&project))?;

    if let Some(ref customer) = args.customer {
        let needle = customer.to_lowercase();
        rfqs.retain(|r| r.customer.to_lowercase().contains(&needle));
    }
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        rfqs.retain(|r| {
            r.title.to_lowercase().contains(&needle)
                || r.reference
                    .as_ref()
                    .is_some_and(|x| x.to_lowercase().contains(&needle))
        });
    }
    rfqs.sort_by(|a, b| a.created.cmp(&b.created));

    if args.count {
        println!("{}", rfqs.len());
        return Ok(());
    }

    if rfqs.is_empty() {
        println!("No enquiries found.");
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rfqs).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&rfqs).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("id,title,customer,reference,due_date,parts,status");
            for r in &rfqs {
                println!(
                    "{},{},{},{},{},{},{}",
                    r.id,
                    escape_csv(&r.title),
                    escape_csv(&r.customer),
                    escape_csv(r.reference.as_deref().unwrap_or("")),
                    r.due_date.map_or(String::new(), |d| d.to_string()),
                    r.parts.len(),
                    r.status
                );
            }
        }
        OutputFormat::Id => {
            for r in &rfqs {
                println!("{}", r.id);
            }
        }
        _ => {
            println!(
                "{:<17} {:<22} {:<16} {:<12} {:<6} {:<10}",
                style("ID").bold(),
                style("TITLE").bold(),
                style("CUSTOMER").bold(),
                style("DUE").bold(),
                style("PARTS").bold(),
                style("STATUS").bold()
            );
            println!("{}", "-".repeat(88));
            for r in &rfqs {
                let due = r.due_date.map_or("-".to_string(), |d| d.to_string());
                println!(
                    "{:<17} {:<22} {:<16} {:<12} {:<6} {:<10}",
                    style(format_short_id(&r.id)).cyan(),
                    truncate_str(&r.title, 20),
                    truncate_str(&r.customer, 14),
                    due,
                    r.parts.len(),
                    r.status
                );
            }
            println!();
            println!("{} enquiry(ies) found.", style(rfqs.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let mut rfq = Rfq::new(args.title.as_str(), args.customer.as_str(), config.author());
    rfq.reference = args.reference;
    rfq.due_date = args.due;

    let file_path = project.entity_path(EntityPrefix::Rfq, &rfq.id);
    loader::save_entity(&file_path, &rfq)?;

    println!(
        "{} Created enquiry {}",
        style("✓").green(),
        style(format_short_id(&rfq.id)).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!("   Customer: {}", style(&rfq.customer).yellow());

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, rfq) = load_rfq(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rfq).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => {
            println!("{}", rfq.id);
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
    let (path, _) = load_rfq(&project, &args.id)?;
    config.run_editor(&path).into_diagnostic()?;
    Ok(())
}

fn run_add_part(args: AddPartArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut rfq) = load_rfq(&project, &args.id)?;

    if args.weight <= 0.0 {
        return Err(miette::miette!(
            "Net weight must be positive (got {} kg)",
            args.weight
        ));
    }

    rfq.add_part(RfqPart {
        part_number: args.part.clone(),
        description: args.description,
        material: args.material,
        net_weight_kg: args.weight,
        quantities: args.qty,
    });
    loader::save_entity(&path, &rfq)?;

    println!(
        "{} Added part {} ({} on enquiry)",
        style("✓").green(),
        style(&args.part).yellow(),
        rfq.parts.len()
    );
    Ok(())
}

fn run_estimate(args: EstimateArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (_, rfq) = load_rfq(&project, &args.id)?;

    if rfq.parts.is_empty() {
        println!("Enquiry has no parts. Add some with {}.", style("fqt rfq add-part").yellow());
        return Ok(());
    }

    let mut settings = config.costing_settings();
    if args.p80 {
        settings.use_p80 = true;
    }
    let as_of = chrono::Utc::now().date_naive();
    let material_dir = project.entity_dir(EntityPrefix::Mat);

    println!(
        "{} - {} ({} parts)",
        style(&rfq.title).bold(),
        rfq.customer,
        rfq.parts.len()
    );
    println!();

    for part in &rfq.parts {
        println!("{}", style(&part.part_number).cyan());

        let Some(ref material_ref) = part.material else {
            println!("  {} no material assigned; cannot estimate", style("!").yellow());
            continue;
        };

        let Some((_, material)) = loader::load_entity::<Material>(&material_dir, material_ref)?
        else {
            println!(
                "  {} material '{}' not found",
                style("!").yellow(),
                material_ref
            );
            continue;
        };

        if part.quantities.is_empty() {
            println!("  {} no quantities requested", style("!").yellow());
            continue;
        }

        for &qty in &part.quantities {
            match estimate_material_cost(&material, part.net_weight_kg, qty, as_of, &settings) {
                Ok(est) => {
                    println!(
                        "  qty {:>6}: material/part {} (price {:.2}/kg, buy weight {:.3} kg)",
                        qty,
                        style(format!("{:.2}", est.cost_per_part)).green(),
                        est.price_per_kg,
                        est.buy_weight_per_part_kg
                    );
                }
                Err(e) => {
                    // No estimate is not a zero estimate; show the reason instead
                    println!("  qty {:>6}: {} {}", qty, style("!").yellow(), e);
                }
            }
        }
    }

    Ok(())
}
