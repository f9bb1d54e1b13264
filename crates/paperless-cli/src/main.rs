//! Paperless CLI: offline KYC witnesses, DID registration and registry
//! administration.
//!
//! Subcommands: witness, oracle, identity, register, auth, did-exists,
//! banned, ban, unban, revoke.

mod commands;
mod context;
mod gateway;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Paperless: privacy-preserving DIDs from offline KYC documents.
#[derive(Parser, Debug)]
#[command(name = "paperless", version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify an offline KYC archive locally and write a witness.
    Witness(commands::witness::WitnessArgs),
    /// Verify an offline KYC archive through a remote oracle.
    Oracle(commands::oracle::OracleArgs),
    /// Print the identity hash of a witness.
    Identity(commands::identity::IdentityArgs),
    /// Register a DID on the registry.
    Register(commands::register::RegisterArgs),
    /// Check whether a wallet holds a DID.
    Auth(commands::query::AuthArgs),
    /// Check whether a DID exists.
    DidExists(commands::query::DidExistsArgs),
    /// Check whether an identity is banned.
    Banned(commands::query::BannedArgs),
    /// Ban an identity (contract owner only).
    Ban(commands::admin::IdentityTarget),
    /// Lift a ban (contract owner only).
    Unban(commands::admin::IdentityTarget),
    /// Revoke a DID (contract owner only).
    Revoke(commands::admin::RevokeArgs),
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match &cli.command {
        Commands::Witness(args) => commands::witness::run(args),
        Commands::Oracle(args) => commands::oracle::run(args).await,
        Commands::Identity(args) => commands::identity::run(args),
        Commands::Register(args) => commands::register::run(args).await,
        Commands::Auth(args) => commands::query::auth(args).await,
        Commands::DidExists(args) => commands::query::did_exists(args).await,
        Commands::Banned(args) => commands::query::banned(args).await,
        Commands::Ban(args) => commands::admin::ban(args).await,
        Commands::Unban(args) => commands::admin::unban(args).await,
        Commands::Revoke(args) => commands::admin::revoke(args).await,
    }
}
