//! Tradepost CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tp-cli migrate
//!
//! # Ensure the configured super-admin account exists (same routine the
//! # server runs at startup, usable out-of-band)
//! tp-cli super-admin ensure
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `super-admin ensure` - Idempotently create the super-admin account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tp-cli")]
#[command(author, version, about = "Tradepost CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the super-admin account
    SuperAdmin {
        #[command(subcommand)]
        action: SuperAdminAction,
    },
}

#[derive(Subcommand)]
enum SuperAdminAction {
    /// Idempotently create the configured super-admin account
    Ensure,
}

#[tokio::main]
async fn main() -> Result<(), commands::CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tp_cli=info,tradepost_api=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::SuperAdmin {
            action: SuperAdminAction::Ensure,
        } => commands::super_admin::ensure().await,
    }
}
