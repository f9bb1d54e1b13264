//! `paperless register`: register a DID for a witness.

use clap::Args;
use std::path::PathBuf;

use paperless_core::{ErrorKind, WalletRole};
use paperless_registry::RegistryError;

use crate::context::{Registry, RegistryArgs};

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Register with the admin wallet. The first admin registration
    /// becomes the contract owner.
    #[arg(long)]
    pub admin: bool,

    /// Witness JSON file.
    #[arg(short, long, default_value = "witness.json")]
    pub witness: PathBuf,
}

fn hint(err: &RegistryError) -> Option<&'static str> {
    match err.kind() {
        ErrorKind::IdentifierAlreadyRegistered => {
            Some("This credential and salt are already registered; fetch a fresh witness.")
        }
        ErrorKind::WalletAlreadyHasDid => {
            Some("Each wallet holds one DID. Use a different wallet or have the admin revoke it.")
        }
        ErrorKind::IdentityBanned => Some("This identity has been banned by the registry owner."),
        _ => None,
    }
}

pub async fn run(args: &RegisterArgs) -> anyhow::Result<()> {
    let witness = super::read_witness(&args.witness)?;
    let role = if args.admin {
        WalletRole::Admin
    } else {
        WalletRole::User
    };

    let registry = Registry::connect(&args.registry)?;
    let session = registry.open(role).await?;

    println!("Registering DID ({role})...");
    println!("  Identity:    {}", witness.credential_id().short());
    println!("  Eligible:    {}", witness.is_eligible());

    let outcome = registry.client.register(&session, &witness).await;
    session.close().await?;

    match outcome {
        Ok(result) => {
            println!("DID registration successful");
            super::print_transaction(&result, &registry.client);
            if args.admin {
                println!("  Registered to the admin wallet (contract owner)");
            }
            Ok(())
        }
        Err(err) => {
            if let Some(hint) = hint(&err) {
                eprintln!("{hint}");
            }
            Err(err.into())
        }
    }
}
