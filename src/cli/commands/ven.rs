//! `fqt ven` command - Vendor management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, format_short_id, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::Config;
use crate::entities::vendor::Vendor;

#[derive(Subcommand, Debug)]
pub enum VenCommands {
    /// List vendors
    List(ListArgs),

    /// Create a new vendor
    New(NewArgs),

    /// Show a vendor's details
    Show(ShowArgs),

    /// Edit a vendor in your editor
    Edit(EditArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by process offered (substring match)
    #[arg(long, short = 'P')]
    pub process: Option<String>,

    /// Filter by certification held (substring match)
    #[arg(long)]
    pub cert: Option<String>,

    /// Search in title
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Vendor name - REQUIRED
    #[arg(long, short = 'T')]
    pub title: String,

    /// Processes offered (can specify multiple)
    #[arg(long, short = 'P', value_delimiter = ',')]
    pub process: Vec<String>,

    /// Certifications held (can specify multiple)
    #[arg(long, value_delimiter = ',')]
    pub cert: Vec<String>,

    /// Typical lead time in days
    #[arg(long, short = 'l')]
    pub lead_time: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Vendor ID (or unique ID fragment)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Vendor ID (or unique ID fragment)
    pub id: String,
}

/// Run a ven subcommand
pub fn run(cmd: VenCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        VenCommands::List(args) => run_list(args, global),
        VenCommands::New(args) => run_new(args),
        VenCommands::Show(args) => run_show(args, global),
        VenCommands::Edit(args) => run_edit(args),
    }
}

fn vendor_dir(project: &Project) -> std::path::PathBuf {
    project.entity_dir(EntityPrefix::Ven)
}

fn load_vendor(project: &Project, id: &str) -> Result<(std::path::PathBuf, Vendor)> {
    loader::load_entity::<Vendor>(&vendor_dir(project), id)?
        .ok_or_else(|| miette::miette!("No vendor found matching '{}'", id))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut vendors: Vec<Vendor> = loader::load_all(&vendor_dir(&project))?;

    if let Some(ref process) = args.process {
        let needle = process.to_lowercase();
        vendors.retain(|v| v.processes.iter().any(|p| p.to_lowercase().contains(&needle)));
    }
    if let Some(ref cert) = args.cert {
        let needle = cert.to_lowercase();
        vendors.retain(|v| {
            v.certifications
                .iter()
                .any(|c| c.to_lowercase().contains(&needle))
        });
    }
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        vendors.retain(|v| v.title.to_lowercase().contains(&needle));
    }
    vendors.sort_by(|a, b| a.title.cmp(&b.title));

    if args.count {
        println!("{}", vendors.len());
        return Ok(());
    }

    if vendors.is_empty() {
        println!("No vendors found.");
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&vendors).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&vendors).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("id,title,processes,certifications,lead_time_days");
            for v in &vendors {
                println!(
                    "{},{},{},{},{}",
                    v.id,
                    escape_csv(&v.title),
                    escape_csv(&v.processes.join("; ")),
                    escape_csv(&v.certifications.join("; ")),
                    v.lead_time_days.map_or(String::new(), |d| d.to_string())
                );
            }
        }
        OutputFormat::Id => {
            for v in &vendors {
                println!("{}", v.id);
            }
        }
        _ => {
            println!(
                "{:<17} {:<22} {:<24} {:<8}",
                style("ID").bold(),
                style("TITLE").bold(),
                style("PROCESSES").bold(),
                style("LEAD").bold()
            );
            println!("{}", "-".repeat(75));
            for v in &vendors {
                let lead = v
                    .lead_time_days
                    .map_or("-".to_string(), |d| format!("{}d", d));
                println!(
                    "{:<17} {:<22} {:<24} {:<8}",
                    style(format_short_id(&v.id)).cyan(),
                    truncate_str(&v.title, 20),
                    truncate_str(&v.processes.join(", "), 22),
                    lead
                );
            }
            println!();
            println!("{} vendor(s) found.", style(vendors.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let mut vendor = Vendor::new(args.title.as_str(), config.author());
    vendor.processes = args.process;
    vendor.certifications = args.cert;
    vendor.lead_time_days = args.lead_time;

    let file_path = project.entity_path(EntityPrefix::Ven, &vendor.id);
    loader::save_entity(&file_path, &vendor)?;

    println!(
        "{} Created vendor {}",
        style("✓").green(),
        style(format_short_id(&vendor.id)).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    if !vendor.processes.is_empty() {
        println!("   Processes: {}", vendor.processes.join(", "));
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, vendor) = load_vendor(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&vendor).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => {
            println!("{}", vendor.id);
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
    let (path, _) = load_vendor(&project, &args.id)?;
    config.run_editor(&path).into_diagnostic()?;
    Ok(())
}
