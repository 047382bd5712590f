//! CLI entry point for portfolio pulse.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use portfolio_pulse::ReferenceData;
use portfolio_pulse_cli::commands::{self, Session, UploadOptions};
use portfolio_pulse_cli::config::Config;
use portfolio_pulse_cli::error::{Error, Result};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Score a portfolio against reference models and suggest rebalancing trades")]
#[command(version)]
struct Cli {
    /// Path to pulse.toml
    #[arg(long, default_value = "pulse.toml")]
    config: PathBuf,

    /// Bearer token identifying the user
    #[arg(long, env = "PULSE_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize and store a portfolio.json
    Upload {
        /// Path to portfolio.json
        file: PathBuf,

        /// Replace an existing portfolio without asking
        #[arg(long)]
        force: bool,
    },

    /// Score the stored portfolio
    Score,

    /// Compare the stored portfolio with every reference model
    Compare,

    /// Suggest trades toward the closest reference model
    Rebalance,

    /// List the reference models
    Models,
}

fn allow_anonymous_env() -> bool {
    std::env::var("ALLOW_ANON")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    if let Command::Models = cli.command {
        commands::show_models(&ReferenceData::standard());
        return Ok(());
    }

    let session = Session::open(config, cli.token.as_deref(), allow_anonymous_env())?;
    match cli.command {
        Command::Upload { file, force } => {
            commands::run_upload(&session, &file, &UploadOptions { force }).map(|_| ())
        }
        Command::Score => commands::run_score(&session).map(|_| ()),
        Command::Compare => commands::run_compare(&session).map(|_| ()),
        Command::Rebalance => commands::run_rebalance(&session).map(|_| ()),
        Command::Models => Ok(()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(cli, &config) {
        match &e {
            e if e.is_auth() => {
                eprintln!("Authentication failed: {e}");
                process::exit(2);
            }
            Error::Aborted(msg) => {
                eprintln!("Aborted: {msg}");
                process::exit(0);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
