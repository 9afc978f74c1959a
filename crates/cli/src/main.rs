//! Bazaar CLI - Database migrations and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! bazaar-cli migrate
//!
//! # Create an API user and print their token
//! bazaar-cli user create -e shopper@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create API users

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage API users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user and print their API token
    Create {
        /// User email address
        #[arg(short, long)]
        email: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { email } => commands::user::create(&email).await?,
        },
    }
    Ok(())
}
