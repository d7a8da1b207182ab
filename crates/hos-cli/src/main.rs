use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hos_cli::commands::{change, export, finalize, geocode, grid, logs, route, status, sync, trip};
use hos_cli::{Cli, Commands, Config};

/// Load config, ensuring the database directory exists.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }
    }
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
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::Status(args) => status::run(&mut out, args, &config)?,
        Commands::Change(args) => change::run(&mut out, args, &config)?,
        Commands::Finalize(args) => finalize::run(&mut out, args, &config)?,
        Commands::Grid(args) => grid::run(&mut out, args, &config)?,
        Commands::Logs(args) => logs::run(&mut out, args, &config)?,
        Commands::Export(args) => export::run(&mut out, args, &config)?,
        Commands::Sync(args) => {
            let report = sync::run(&mut out, args, &config)?;
            if report.failed > 0 {
                anyhow::bail!("{} daily logs failed to sync", report.failed);
            }
        }
        Commands::Trip(args) => trip::run(&mut out, args, &config)?,
        Commands::Route(args) => route::run(&mut out, args, &config)?,
        Commands::Geocode(args) => geocode::run(&mut out, args, &config)?,
    }
    out.flush()?;

    Ok(())
}
