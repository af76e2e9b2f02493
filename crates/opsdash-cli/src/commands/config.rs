use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use opsdash_cli::cli::ConfigCommands;
use opsdash_core::DashboardConfig;

pub fn handle(command: &ConfigCommands, config_path: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = match config_path {
                Some(path) => DashboardConfig::load_from(path)?,
                None => DashboardConfig::load()?,
            };
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigCommands::Init { out, force } => {
            let target: PathBuf = out
                .clone()
                .or_else(|| config_path.map(Path::to_path_buf))
                .or_else(DashboardConfig::config_path)
                .ok_or_else(|| anyhow!("unable to determine config path"))?;

            if target.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                );
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            DashboardConfig::default().save_to(&target)?;
            println!("Wrote default config to {}", target.display());
            Ok(())
        }
    }
}
