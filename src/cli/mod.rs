//! CLI module for the Northwind customers service
//!
//! - `serve`: run the customers API server
//! - `migrate`: apply PostgreSQL migrations and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, LoggingConfig};
use crate::infrastructure::logging;

/// Northwind customers service - cached customer records over a durable store
#[derive(Parser)]
#[command(name = "northwind-customers")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the customers API server
    Serve,

    /// Apply PostgreSQL migrations for the customer table
    Migrate,
}

/// Reads `.env`, then layered configuration
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    Ok(AppConfig::load()?)
}

pub(crate) fn logging_config(config: &LoggingConfig) -> logging::LoggingConfig {
    logging::LoggingConfig {
        level: config.level.clone(),
        format: config.format.clone(),
    }
}
