//! Ragserve CLI
//!
//! Grounded question answering over local document collections.

use anyhow::Result;
use clap::Parser;
use ragserve_core::error::exit_codes;
use ragserve_core::{Config, Database, RagError};
use std::process::ExitCode;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Config => commands::config::run(&config, cli.format),
        Commands::Query(args) => {
            let db = open_database(&config)?;
            commands::query::run(args, db, &config, cli.format).await
        }
        Commands::Ingest(args) => {
            let db = open_database(&config)?;
            commands::ingest::run(args, &db, &config, cli.format).await
        }
        Commands::Collection(args) => {
            let db = open_database(&config)?;
            commands::collection::run(args, &db, cli.format)
        }
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let db = Database::open(config.database_path())?;
    db.initialize()?;
    Ok(db)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<RagError>()
        .map(RagError::exit_code)
        .unwrap_or(exit_codes::GENERAL_ERROR);
    u8::try_from(code).unwrap_or(1)
}
