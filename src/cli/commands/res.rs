//! `fqt res` command - Resource (work centre) management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;

use crate::cli::helpers::{escape_csv, format_money, format_short_id, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::Config;
use crate::entities::resource::{Resource, ResourceType};

#[derive(Subcommand, Debug)]
pub enum ResCommands {
    /// List resources
    List(ListArgs),

    /// Create a new resource
    New(NewArgs),

    /// Show a resource's details
    Show(ShowArgs),

    /// Edit a resource in your editor
    Edit(EditArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in title
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Resource name (e.g., "DMG MORI NLX 2500") - REQUIRED
    #[arg(long, short = 'T')]
    pub title: String,

    /// Resource type (turning, milling, grinding, edm, inspection, assembly, finishing, manual)
    #[arg(long, short = 't', default_value = "milling")]
    pub r#type: ResourceType,

    /// Fully burdened hourly rate - REQUIRED
    #[arg(long, short = 'r')]
    pub rate: Decimal,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Resource ID (or unique ID fragment)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Resource ID (or unique ID fragment)
    pub id: String,
}

/// Run a res subcommand
pub fn run(cmd: ResCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ResCommands::List(args) => run_list(args, global),
        ResCommands::New(args) => run_new(args),
        ResCommands::Show(args) => run_show(args, global),
        ResCommands::Edit(args) => run_edit(args),
    }
}

fn resource_dir(project: &Project) -> std::path::PathBuf {
    project.entity_dir(EntityPrefix::Res)
}

fn load_resource(project: &Project, id: &str) -> Result<(std::path::PathBuf, Resource)> {
    loader::load_entity::<Resource>(&resource_dir(project), id)?
        .ok_or_else(|| miette::miette!("No resource found matching '{}'", id))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut resources: Vec<Resource> = loader::load_all(&resource_dir(&project))?;

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        resources.retain(|r| r.title.to_lowercase().contains(&needle));
    }
    resources.sort_by(|a, b| a.title.cmp(&b.title));

    if args.count {
        println!("{}", resources.len());
        return Ok(());
    }

    if resources.is_empty() {
        println!("No resources found.");
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&resources).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&resources).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("id,title,type,cost_per_hour");
            for r in &resources {
                println!(
                    "{},{},{},{}",
                    r.id,
                    escape_csv(&r.title),
                    r.resource_type,
                    format_money(r.cost_per_hour)
                );
            }
        }
        OutputFormat::Id => {
            for r in &resources {
                println!("{}", r.id);
            }
        }
        _ => {
            println!(
                "{:<17} {:<26} {:<12} {:>10}",
                style("ID").bold(),
                style("TITLE").bold(),
                style("TYPE").bold(),
                style("RATE/H").bold()
            );
            println!("{}", "-".repeat(70));
            for r in &resources {
                println!(
                    "{:<17} {:<26} {:<12} {:>10}",
                    style(format_short_id(&r.id)).cyan(),
                    truncate_str(&r.title, 24),
                    r.resource_type,
                    format_money(r.cost_per_hour)
                );
            }
            println!();
            println!("{} resource(s) found.", style(resources.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    if args.rate <= Decimal::ZERO {
        return Err(miette::miette!(
            "Hourly rate must be positive (got {})",
            args.rate
        ));
    }

    let resource = Resource::new(args.title.as_str(), args.r#type, args.rate, config.author());

    let file_path = project.entity_path(EntityPrefix::Res, &resource.id);
    loader::save_entity(&file_path, &resource)?;

    println!(
        "{} Created resource {}",
        style("✓").green(),
        style(format_short_id(&resource.id)).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!(
        "   Type: {} | Rate: {}/h",
        resource.resource_type,
        style(format_money(resource.cost_per_hour)).yellow()
    );

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, resource) = load_resource(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&resource).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => {
            println!("{}", resource.id);
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
    let (path, _) = load_resource(&project, &args.id)?;
    config.run_editor(&path).into_diagnostic()?;
    Ok(())
}
