use clap::Parser;
use fqt::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => fqt::cli::commands::init::run(args),
        Commands::Quot(cmd) => fqt::cli::commands::quot::run(cmd, &global),
        Commands::Mat(cmd) => fqt::cli::commands::mat::run(cmd, &global),
        Commands::Res(cmd) => fqt::cli::commands::res::run(cmd, &global),
        Commands::Ven(cmd) => fqt::cli::commands::ven::run(cmd, &global),
        Commands::Rfq(cmd) => fqt::cli::commands::rfq::run(cmd, &global),
        Commands::Import(cmd) => fqt::cli::commands::import::run(cmd),
        Commands::Report(cmd) => fqt::cli::commands::report::run(cmd, &global),
        Commands::Config(cmd) => fqt::cli::commands::config::run(cmd),
        Commands::Completions(args) => fqt::cli::commands::completions::run(args),
    }
}
