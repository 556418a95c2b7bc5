//! CLI entry point for accountdesk.
//!
//! This binary provides the `accountdesk` command: one subcommand per page
//! of the desk (register, verify, login, dashboard, profile, users,
//! contact). Each run loads state from the local database, performs one
//! action and exits.

mod cli;
mod commands;
mod config;
mod helpers;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use accountdesk_store::Database;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::cli::Cli;
use crate::commands::Desk;
use crate::config::{AppConfig, DATA_DIR_ENV, DB_FILE};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    helpers::init_tracing(&config.log.level);

    let data_dir = config.data_dir(
        std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
        cli.data_dir.clone(),
    );
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let db_path = data_dir.join(DB_FILE);
    let db = Database::open_and_migrate(db_path.clone())
        .await
        .context("failed to open database")?;
    info!(path = %db_path.display(), "store initialized");

    let mut desk = Desk::open(&config, db).await;
    let mut stdout = io::stdout().lock();
    let outcome = desk.run(cli.command, &mut stdout).await?;
    Ok(outcome.into())
}
