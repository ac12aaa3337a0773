//! Bounty Ledger CLI
//!
//! Replays ledger scripts and inspects the resulting state.

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::Result;
use bounty_ledger::Config;
use clap::{Parser, Subcommand};
use style::*;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "bounty")]
#[command(author = "CortexLM")]
#[command(version)]
#[command(about = "Bounty Ledger - escrowed bounties with exactly-once payouts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (embedded defaults are used when missing)
    #[arg(
        short,
        long,
        env = "BOUNTY_CONFIG",
        default_value = "config.toml",
        global = true
    )]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script against a fresh ledger
    #[command(visible_alias = "r")]
    Replay {
        /// Script file (TOML)
        script: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a script and show one bounty with its propositions
    #[command(visible_alias = "i")]
    Inspect {
        /// Script file (TOML)
        script: PathBuf,

        /// Bounty id
        bounty: String,
    },

    /// Show the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load_from(&cli.config)?;
    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Replay { script, json } => {
            if !json {
                print_banner();
            }
            let mismatches = commands::replay::run(&config, &script, json)?;
            if mismatches > 0 {
                anyhow::bail!("{} step(s) did not match their expected outcome", mismatches);
            }
            Ok(())
        }
        Commands::Inspect { script, bounty } => commands::inspect::run(&config, &script, &bounty),
        Commands::Config => commands::config::run(&config, &cli.config),
    }
}

/// RUST_LOG wins, then `--verbose` (debug), then the configured filter.
fn init_logging(config: &Config, verbose: bool) {
    let fallback = config.cli_log_filter(verbose);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_banner() {
    println!(
        "  {} {}",
        style_bold("Bounty Ledger"),
        style_dim(&format!("v{}", VERSION))
    );
}
