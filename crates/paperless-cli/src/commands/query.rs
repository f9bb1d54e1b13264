//! Read-only registry queries: `auth`, `did-exists`, `banned`.

use clap::Args;

use paperless_core::{Bytes32, Did, WalletRole};

use crate::context::{Registry, RegistryArgs};

#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Check the admin wallet instead of the user wallet.
    #[arg(long)]
    pub admin: bool,
}

#[derive(Args, Debug)]
pub struct DidExistsArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// DID as hex or `did:midnight:<network>:<hex>`.
    pub did: String,
}

#[derive(Args, Debug)]
pub struct BannedArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Identity hash (hex, right-padded to 32 bytes).
    pub identity: String,
}

pub async fn auth(args: &AuthArgs) -> anyhow::Result<()> {
    let role = if args.admin {
        WalletRole::Admin
    } else {
        WalletRole::User
    };
    let registry = Registry::connect(&args.registry)?;
    let session = registry.open_unsynced(role).await?;
    let wallet_hash = session.wallet_hash();
    let authenticated = registry.client.is_authenticated(wallet_hash).await;
    session.close().await?;

    if authenticated? {
        println!("Wallet is authenticated (holds a DID)");
    } else {
        println!("Wallet is not authenticated (no DID found)");
    }
    Ok(())
}

pub async fn did_exists(args: &DidExistsArgs) -> anyhow::Result<()> {
    let did = Did::parse(&args.did)?;
    let registry = Registry::connect(&args.registry)?;
    if registry.client.did_exists(did).await? {
        println!("DID exists in registry: {}", registry.client.did_uri(&did));
    } else {
        println!("DID not found in registry");
    }
    Ok(())
}

pub async fn banned(args: &BannedArgs) -> anyhow::Result<()> {
    let identity = Bytes32::from_hex_padded(&args.identity)?;
    let registry = Registry::connect(&args.registry)?;
    if registry.client.is_identity_banned(identity).await? {
        println!("Identity is BANNED");
    } else {
        println!("Identity is not banned");
    }
    Ok(())
}
