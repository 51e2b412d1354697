//! CLI configuration management
//!
//! Provides `parley config {show,init}` for viewing the effective settings
//! and writing them out as a starting point for config/local.toml.

use crate::app::AppConfig;
use anyhow::{bail, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

const LOCAL_CONFIG_PATH: &str = "config/local.toml";

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Write the effective configuration to a file
    Init {
        /// Target file
        #[arg(long, default_value = LOCAL_CONFIG_PATH)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(app: &AppConfig, cmd: &ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            print!("{}", app.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { path, force } => cmd_init(app, path, *force),
    }
}

fn cmd_init(app: &AppConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    app.save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
