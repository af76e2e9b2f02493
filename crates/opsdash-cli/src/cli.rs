use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use opsdash_core::FormulaVariant;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "opsdash", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Configuration file (defaults to ~/.opsdash/config.toml)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive metrics for a single input vector
    Derive {
        /// Active users (0-100)
        #[arg(long, default_value_t = 0.0)]
        users: f64,
        /// Load (0-1000)
        #[arg(long, default_value_t = 0.0)]
        load: f64,
        /// Operator efficiency baseline (0-100)
        #[arg(long)]
        efficiency: Option<f64>,
        /// Efficiency baseline policy: fixed, operator_baseline or feedback (overrides config)
        #[arg(long)]
        variant: Option<FormulaVariant>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Feed slider events through a dashboard and print the resulting cards
    Replay {
        /// File with one `name=value` or JSON event per line (`-` for stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        events: PathBuf,
        /// Prediction endpoint (enables predictions for this run)
        #[arg(long)]
        endpoint: Option<String>,
        /// Print the cards after every event instead of only at the end
        #[arg(long)]
        every: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Write a default configuration file
    Init {
        /// Target path (defaults to the --config path or ~/.opsdash/config.toml)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
