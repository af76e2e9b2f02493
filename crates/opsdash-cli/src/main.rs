use std::path::Path;

use clap::Parser;
use opsdash_cli::cli::{Cli, Commands};
use opsdash_core::DashboardConfig;
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn load_config(path: Option<&Path>) -> anyhow::Result<DashboardConfig> {
    let config = match path {
        Some(path) => DashboardConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("loading config {}: {e}", path.display()))?,
        None => DashboardConfig::load()?,
    };
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Derive {
            users,
            load,
            efficiency,
            variant,
            format,
        } => {
            let config = load_config(cli.config.as_deref())?;
            commands::derive::handle(config, *users, *load, *efficiency, *variant, *format)
        }
        Commands::Replay {
            events,
            endpoint,
            every,
            format,
        } => {
            let config = load_config(cli.config.as_deref())?;
            commands::replay::handle(config, events, endpoint.as_deref(), *every, *format)
        }
        Commands::Config { command } => commands::config::handle(command, cli.config.as_deref()),
        Commands::Completions { shell, out } => {
            commands::completions::handle(*shell, out.as_deref())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("opsdash {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
