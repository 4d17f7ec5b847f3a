use anyhow::Result;

use swiftrun::cli::{Cli, Commands, Invocation, USAGE};
use swiftrun::commands;
use swiftrun::logging;

fn main() -> Result<()> {
    // Initialize structured logging
    logging::init();

    match Invocation::from_args(std::env::args().collect()) {
        Invocation::Run(request) => commands::run::run(&request),
        Invocation::Manage(cli) => manage(cli),
        Invocation::Usage => {
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    }
}

fn manage(cli: Cli) -> Result<()> {
    let settings = commands::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Cache(args) => commands::cache::cache(&args, &settings),
    }
}
