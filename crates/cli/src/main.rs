//! Live MART CLI - database migrations and demo data.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! lm-cli migrate
//!
//! # Fill an empty database with demo data
//! lm-cli seed
//!
//! # Wipe every table first, then seed
//! lm-cli seed --reset
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lm-cli")]
#[command(author, version, about = "Live MART CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo accounts, products, and orders
    Seed {
        /// Truncate all tables before seeding
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { reset } => commands::seed::run(reset).await?,
    }
    Ok(())
}
