//! Practicum access core - operator CLI
//!
//! Issues and inspects tokens, and evaluates permission checks against a
//! JSON fixture of identities and relationships.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use practicum_authz::repository::{InMemoryRepository, RepositoryFixture};
use practicum_authz::{AccessConfig, AccessCore, Action, Resource};
use practicum_token::TokenPayload;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Practicum access core CLI
#[derive(Parser)]
#[command(name = "practicum-access")]
#[command(about = "Practicum identity and access core")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/access.toml", env = "PRACTICUM_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue an access/refresh token pair
    Issue {
        /// Subject id written to the `id` claim
        #[arg(short, long)]
        subject: String,

        /// Role names (repeatable)
        #[arg(short, long = "role")]
        roles: Vec<String>,
    },

    /// Verify a token and print its claims
    Verify {
        token: String,
    },

    /// Evaluate a permission check
    Check {
        /// JSON fixture with users and relationship rows
        #[arg(short, long)]
        fixtures: PathBuf,

        /// Requesting subject id
        #[arg(short, long)]
        subject: String,

        /// Resource kind (e.g. `Student`)
        #[arg(short, long)]
        resource: Resource,

        /// Action (e.g. `Read`)
        #[arg(short, long)]
        action: Action,

        /// Target resource instance id
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},practicum_authz={}", log_level, log_level).into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(&cli.config)?;
    config.apply_env();
    config.validate().context("Configuration validation failed")?;

    match cli.command {
        Command::Issue { subject, roles } => {
            let core = AccessCore::from_config(config, Arc::new(InMemoryRepository::default()))?;
            let payload = roles
                .into_iter()
                .fold(TokenPayload::new(subject), |payload, role| payload.with_role(role));

            let pair = core.issue_tokens(&payload)?;
            println!("{}", serde_json::to_string_pretty(&pair)?);
        }

        Command::Verify { token } => {
            let core = AccessCore::from_config(config, Arc::new(InMemoryRepository::default()))?;
            match core.tokens().decode(&token) {
                Ok(claims) => println!("{}", serde_json::to_string_pretty(&claims)?),
                Err(e) => {
                    error!("Token rejected: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Command::Check {
            fixtures,
            subject,
            resource,
            action,
            id,
        } => {
            let fixture = RepositoryFixture::load(&fixtures)?;
            let core = AccessCore::from_config(config, Arc::new(InMemoryRepository::new(fixture)))?;

            let requester = core.identities().resolve(&subject).await?;
            info!(subject = %subject, roles = ?requester.roles, "Identity resolved");

            let decision = core.engine().decide(&requester, resource, action, &id).await;
            println!("{}", serde_json::to_string_pretty(&decision)?);

            if !decision.allowed {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<AccessConfig> {
    if path.exists() {
        info!("Loading configuration from {:?}", path);
        AccessConfig::load(path)
    } else {
        info!("Configuration file not found, using defaults");
        Ok(AccessConfig::default())
    }
}
