//! Uniformly CLI - Database migrations and seed data.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront database migrations
//! uf-cli migrate
//!
//! # Insert the built-in school directory
//! uf-cli seed schools
//!
//! # Insert demo customer accounts
//! uf-cli seed users
//!
//! # Remove catalog products that no order refers to
//! uf-cli seed products --clear
//! ```
//!
//! Every command reads `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`), loading
//! a `.env` file first when one exists.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "uf-cli")]
#[command(author, version, about = "Uniformly CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert the built-in school directory, skipping schools already present
    Schools,
    /// Insert demo users, skipping existing emails
    Users,
    /// Manage catalog products
    Products {
        /// Delete every product not referenced by an order item
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Schools => commands::seed::schools().await?,
            SeedTarget::Users => commands::seed::users().await?,
            SeedTarget::Products { clear } => commands::seed::products(clear).await?,
        },
    }
    Ok(())
}
