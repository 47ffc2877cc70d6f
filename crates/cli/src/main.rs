//! Client registry CLI - Database and postal lookup tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the tables in the configured database
//! registry-cli schema
//!
//! # Resolve a postal code against the configured lookup service
//! registry-cli lookup 01001-000
//! ```
//!
//! # Commands
//!
//! - `schema` - Apply the database schema
//! - `lookup` - Resolve a postal code and print the address as JSON

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(author, version, about = "Client registry CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the database schema (idempotent)
    Schema,
    /// Resolve a postal code without touching the database
    Lookup {
        /// Postal code, with or without hyphen
        postal_code: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Schema => commands::schema::apply().await?,
        Commands::Lookup { postal_code } => commands::lookup::resolve(&postal_code).await?,
    }
    Ok(())
}
