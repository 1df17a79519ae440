//! `fqt config` command - Show effective configuration

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective merged configuration
    Show,
}

pub fn run(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => run_show(),
    }
}

fn run_show() -> Result<()> {
    let config = Config::load();
    let settings = config.costing_settings();

    println!("{}", style("General").bold());
    println!("  author:         {}", config.author());
    println!("  editor:         {}", config.editor());
    println!(
        "  default_format: {}",
        config.default_format.as_deref().unwrap_or("auto")
    );
    println!();
    println!("{}", style("Costing").bold());
    println!(
        "  material_markup_percent: {}",
        settings.material_markup_percent
    );
    println!(
        "  subcon_markup_percent:   {}",
        settings.subcon_markup_percent
    );
    println!("  cost_per_hour:           {}", settings.cost_per_hour);
    println!("  use_p80:                 {}", settings.use_p80);
    println!("  contingency_low:         {}", settings.contingency_low);
    println!("  contingency_medium:      {}", settings.contingency_medium);
    println!("  contingency_high:        {}", settings.contingency_high);

    Ok(())
}
