//! Owner-only subcommands: `ban`, `unban`, `revoke`. Always use the admin
//! wallet.

use clap::Args;

use paperless_core::{Bytes32, Did, WalletRole};

use crate::context::{Registry, RegistryArgs};

#[derive(Args, Debug)]
pub struct IdentityTarget {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Identity hash (hex, right-padded to 32 bytes).
    pub identity: String,
}

#[derive(Args, Debug)]
pub struct RevokeArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// DID as hex or `did:midnight:<network>:<hex>`.
    pub did: String,
}

pub async fn ban(args: &IdentityTarget) -> anyhow::Result<()> {
    let identity = Bytes32::from_hex_padded(&args.identity)?;
    let registry = Registry::connect(&args.registry)?;
    let session = registry.open(WalletRole::Admin).await?;

    println!("Banning identity {}...", identity.short());
    let outcome = registry.client.ban(&session, identity).await;
    session.close().await?;

    let result = outcome?;
    println!("Identity banned");
    super::print_transaction(&result, &registry.client);
    Ok(())
}

pub async fn unban(args: &IdentityTarget) -> anyhow::Result<()> {
    let identity = Bytes32::from_hex_padded(&args.identity)?;
    let registry = Registry::connect(&args.registry)?;
    let session = registry.open(WalletRole::Admin).await?;

    println!("Unbanning identity {}...", identity.short());
    let outcome = registry.client.unban(&session, identity).await;
    session.close().await?;

    let result = outcome?;
    println!("Identity unbanned");
    super::print_transaction(&result, &registry.client);
    Ok(())
}

pub async fn revoke(args: &RevokeArgs) -> anyhow::Result<()> {
    let did = Did::parse(&args.did)?;
    let registry = Registry::connect(&args.registry)?;
    let session = registry.open(WalletRole::Admin).await?;

    println!("Revoking {}...", registry.client.did_uri(&did));
    let outcome = registry.client.revoke(&session, did).await;
    session.close().await?;

    let result = outcome?;
    println!("DID revoked");
    super::print_transaction(&result, &registry.client);
    Ok(())
}
