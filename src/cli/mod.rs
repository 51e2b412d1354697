//! CLI module for Parley
//!
//! Provides commands:
//! - `replay`: Feed a JSONL transcript through the engine
//! - `route`: Show which agents would answer a message
//! - `config`: Inspect or write the effective configuration

use crate::app::{load_config, load_config_from, AppConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod config;
pub mod replay;
pub mod route;

/// Parley conversation orchestration CLI
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Multi-agent conversation orchestration engine")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Extra config file layered above config/local.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a JSONL transcript through the engine
    Replay {
        /// Transcript file, one JSON entry per line
        transcript: PathBuf,
        /// Extra time to wait for deferred collaboration after the last entry
        #[arg(long, default_value_t = 200)]
        settle_ms: u64,
    },
    /// Show which agents would answer a user message
    Route {
        /// Session ID
        #[arg(short, long)]
        session: String,
        /// Message text
        text: String,
    },
    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

impl Cli {
    /// Load configuration, honoring `--config`.
    pub fn load_config(&self) -> Result<AppConfig> {
        match &self.config {
            Some(path) => load_config_from(path),
            None => load_config(),
        }
    }
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let app = cli.load_config()?;
    match command {
        Commands::Replay {
            transcript,
            settle_ms,
        } => replay::run(&app, transcript, *settle_ms).await,
        Commands::Route { session, text } => route::run(&app, session, text),
        Commands::Config(cmd) => config::run(&app, cmd),
    }
}
