use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reach_cli::commands::{clients, events, load, report, series};
use reach_cli::{Cli, Commands, Config};

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Report { category, json }) => {
            let config = load_config(&cli)?;
            let set = load::run(&config)?;
            report::run(
                &mut stdout,
                &set,
                &config.engine,
                category.as_deref(),
                *json,
            )?;
        }
        Some(Commands::Clients { category, json }) => {
            let config = load_config(&cli)?;
            let set = load::run(&config)?;
            clients::run(&mut stdout, &set, category.as_deref(), *json)?;
        }
        Some(Commands::Series { category, json }) => {
            let config = load_config(&cli)?;
            let set = load::run(&config)?;
            series::run(&mut stdout, &set, category.as_deref(), *json)?;
        }
        Some(Commands::Events { category }) => {
            let config = load_config(&cli)?;
            let set = load::run(&config)?;
            events::run(&mut stdout, &set, category.as_deref())?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
