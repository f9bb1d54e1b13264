//! Registry connection settings shared by the wallet-backed subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Args;
use serde::Deserialize;

use paperless_core::{NetworkConfig, WalletRole};
use paperless_registry::{RegistryClient, WalletSeed, WalletSession};

use crate::gateway::GatewayClient;

#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Registry gateway URL.
    #[arg(long, env = "PAPERLESS_GATEWAY", default_value = "http://127.0.0.1:8080")]
    pub gateway: String,

    /// Deployed registry contract address. Falls back to `contractAddress`
    /// in the deployment file.
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub contract: Option<String>,

    /// Deployment record written by the contract deployer.
    #[arg(long, default_value = "deployment.json")]
    pub deployment: PathBuf,

    /// Admin wallet seed (64 hex characters).
    #[arg(long, env = "WALLET_SEED", hide_env_values = true)]
    pub admin_seed: Option<String>,

    /// User wallet seed (64 hex characters). A random wallet when absent.
    #[arg(long)]
    pub user_seed: Option<String>,

    /// Give up waiting for wallet sync and funds after this many seconds.
    #[arg(long, default_value_t = 600)]
    pub sync_timeout_secs: u64,

    /// Registry network: `testnet` or `local`. Also the DID URI network
    /// segment.
    #[arg(long, default_value = "testnet")]
    pub network: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Deployment {
    contract_address: Option<String>,
}

/// Explicit address first, then the deployment file.
pub fn resolve_contract_address(explicit: Option<&str>, deployment: &Path) -> anyhow::Result<String> {
    if let Some(address) = explicit.map(str::trim).filter(|a| !a.is_empty()) {
        return Ok(address.to_string());
    }
    if deployment.exists() {
        let text = std::fs::read_to_string(deployment)
            .with_context(|| format!("cannot read {}", deployment.display()))?;
        let record: Deployment = serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", deployment.display()))?;
        if let Some(address) = record.contract_address.filter(|a| !a.is_empty()) {
            return Ok(address);
        }
    }
    anyhow::bail!(
        "no contract address: pass --contract, set CONTRACT_ADDRESS, or deploy first to create {}",
        deployment.display()
    )
}

/// A connected registry client plus the settings needed to open sessions.
pub struct Registry {
    pub gateway: GatewayClient,
    pub client: RegistryClient,
    args: RegistryArgs,
}

impl Registry {
    pub fn connect(args: &RegistryArgs) -> anyhow::Result<Self> {
        let network = NetworkConfig::by_name(&args.network)
            .with_context(|| format!("unknown network {:?}: expected testnet or local", args.network))?;
        let address = resolve_contract_address(args.contract.as_deref(), &args.deployment)?;
        let gateway = GatewayClient::new(args.gateway.clone()).with_network(network.clone());
        let client = RegistryClient::new(
            Arc::new(gateway.contract(address.clone())),
            Arc::new(gateway.prover()),
        )
        .with_network(network.name.clone());
        tracing::info!(
            gateway = %args.gateway,
            contract = %address,
            network = %network.name,
            proof_server = %network.proof_server,
            "registry client ready"
        );
        Ok(Self {
            gateway,
            client,
            args: args.clone(),
        })
    }

    fn seed(&self, role: WalletRole) -> anyhow::Result<WalletSeed> {
        match role {
            WalletRole::Admin => {
                let hex = self
                    .args
                    .admin_seed
                    .as_deref()
                    .context("admin seed missing: pass --admin-seed or set WALLET_SEED")?;
                Ok(WalletSeed::from_hex(hex)?)
            }
            WalletRole::User => match self.args.user_seed.as_deref() {
                Some(hex) => Ok(WalletSeed::from_hex(hex)?),
                None => {
                    let seed = WalletSeed::random();
                    eprintln!("Generated user wallet seed (keep it to reuse this wallet): {}", seed.to_hex());
                    Ok(seed)
                }
            },
        }
    }

    /// Open a session without waiting for sync.
    pub async fn open_unsynced(&self, role: WalletRole) -> anyhow::Result<WalletSession> {
        let seed = self.seed(role)?;
        let session = WalletSession::open(&self.gateway, &seed, role).await?;
        println!("{role} wallet: {}", session.address());
        Ok(session)
    }

    /// Open a session and wait until it is synced and funded.
    pub async fn open(&self, role: WalletRole) -> anyhow::Result<WalletSession> {
        let session = self.open_unsynced(role).await?;
        println!("Waiting for wallet sync and funds...");
        let timeout = Duration::from_secs(self.args.sync_timeout_secs);
        if let Err(err) = session.await_ready_timeout(timeout).await {
            if let Err(close_err) = session.close().await {
                tracing::warn!(error = %close_err, "failed to close unready wallet session");
            }
            return Err(err.into());
        }
        Ok(session)
    }
}
