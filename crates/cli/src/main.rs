//! Zahra Fashion CLI - Database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (including the session table)
//! zahra-cli migrate
//!
//! # Upsert categories and products from a YAML catalog
//! zahra-cli seed crates/cli/data/catalog.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "zahra-cli")]
#[command(author, version, about = "Zahra Fashion CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Upsert categories and products from a YAML catalog file
    Seed {
        /// Path to the catalog file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => {
            let pool = commands::connect().await?;
            commands::migrate::run(&pool).await?;
        }
        Commands::Seed { file } => {
            let catalog = commands::seed::load(&file).await?;
            let pool = commands::connect().await?;
            commands::seed::apply(&pool, &catalog).await?;
        }
    }
    Ok(())
}
