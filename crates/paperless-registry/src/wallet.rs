use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, MutexGuard};
use zeroize::{Zeroize, ZeroizeOnDrop};

use paperless_core::{Bytes32, WalletRole};
use paperless_crypto::hashing;

use crate::contract::{BalancedTransaction, ProvenTransaction, SubmittedTransaction, UnprovenTransaction};
use crate::error::RegistryError;

/// 32-byte wallet seed. Zeroized on drop; never logged.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WalletSeed([u8; 32]);

impl WalletSeed {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, RegistryError> {
        let mut decoded = hex::decode(s.trim())
            .map_err(|e| RegistryError::InvalidInput(format!("seed is not hex: {e}")))?;
        let result = <[u8; 32]>::try_from(decoded.as_slice())
            .map(Self)
            .map_err(|_| {
                RegistryError::InvalidInput(format!("seed must be 32 bytes, got {}", decoded.len()))
            });
        decoded.zeroize();
        result
    }

    /// Fresh random seed.
    pub fn random() -> Self {
        Self(Bytes32::random().0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for WalletSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WalletSeed(..)")
    }
}

/// Synchronization progress reported by a wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub synced: bool,
    pub applied_index: u64,
    pub highest_index: u64,
}

/// Snapshot of a wallet's keys, sync progress and spendable balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub address: String,
    pub coin_public_key: String,
    pub encryption_public_key: String,
    pub sync_progress: SyncProgress,
    /// Native-token balance.
    pub balance: u128,
}

impl WalletState {
    /// Synced and holding a non-zero balance.
    pub fn is_ready(&self) -> bool {
        self.sync_progress.synced && self.balance > 0
    }
}

/// A wallet built from a seed by a [`WalletProvider`].
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Live state; the receiver sees every update.
    fn state(&self) -> watch::Receiver<WalletState>;

    /// Begin synchronizing with the network.
    async fn start(&self) -> Result<(), RegistryError>;

    /// Contribute fee inputs.
    async fn balance_transaction(
        &self,
        tx: UnprovenTransaction,
    ) -> Result<BalancedTransaction, RegistryError>;

    /// Send a proven transaction to the network.
    async fn submit_transaction(
        &self,
        tx: ProvenTransaction,
    ) -> Result<SubmittedTransaction, RegistryError>;

    /// Stop synchronizing and release resources.
    async fn close(&self) -> Result<(), RegistryError>;
}

/// Builds wallets from seeds. Building is deterministic: the same seed
/// always controls the same address.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn build_from_seed(&self, seed: &WalletSeed) -> Result<Arc<dyn Wallet>, RegistryError>;
}

/// A started wallet acting under one role.
///
/// Operations using the session must hold [`WalletSession::lock`] for their
/// whole duration.
pub struct WalletSession {
    role: WalletRole,
    wallet: Arc<dyn Wallet>,
    address: String,
    coin_public_key: String,
    encryption_public_key: String,
    ready: AtomicBool,
    op_lock: Mutex<()>,
}

impl WalletSession {
    /// Build the wallet for `seed` and start synchronizing.
    pub async fn open(
        provider: &dyn WalletProvider,
        seed: &WalletSeed,
        role: WalletRole,
    ) -> Result<Self, RegistryError> {
        let wallet = provider.build_from_seed(seed).await?;
        wallet.start().await?;
        let state = wallet.state().borrow().clone();
        tracing::info!(role = %role, address = %state.address, "wallet session opened");
        Ok(Self {
            role,
            ready: AtomicBool::new(state.is_ready()),
            address: state.address,
            coin_public_key: state.coin_public_key,
            encryption_public_key: state.encryption_public_key,
            wallet,
            op_lock: Mutex::new(()),
        })
    }

    pub fn role(&self) -> WalletRole {
        self.role
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn coin_public_key(&self) -> &str {
        &self.coin_public_key
    }

    pub fn encryption_public_key(&self) -> &str {
        &self.encryption_public_key
    }

    /// SHA-256 of the coin public key, as the registry identifies wallets.
    pub fn wallet_hash(&self) -> Bytes32 {
        hashing::wallet_hash(&self.coin_public_key)
    }

    pub fn wallet(&self) -> &Arc<dyn Wallet> {
        &self.wallet
    }

    /// Latest state snapshot.
    pub fn state(&self) -> WalletState {
        self.wallet.state().borrow().clone()
    }

    /// Whether [`await_ready`](Self::await_ready) has observed a synced,
    /// funded state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Suspend until the wallet reports synced with a non-zero balance.
    /// No timeout; see [`await_ready_timeout`](Self::await_ready_timeout).
    pub async fn await_ready(&self) -> Result<(), RegistryError> {
        let mut rx = self.wallet.state();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.is_ready() {
                    break;
                }
                tracing::debug!(
                    address = %self.address,
                    synced = state.sync_progress.synced,
                    applied = state.sync_progress.applied_index,
                    highest = state.sync_progress.highest_index,
                    balance = %state.balance,
                    "waiting for wallet sync and funds"
                );
            }
            rx.changed()
                .await
                .map_err(|_| RegistryError::Transport("wallet state stream closed".into()))?;
        }
        self.ready.store(true, Ordering::Release);
        tracing::info!(address = %self.address, "wallet synced and funded");
        Ok(())
    }

    /// [`await_ready`](Self::await_ready) bounded by `timeout`.
    pub async fn await_ready_timeout(&self, timeout: Duration) -> Result<(), RegistryError> {
        tokio::time::timeout(timeout, self.await_ready())
            .await
            .map_err(|_| RegistryError::SyncTimeout(timeout))?
    }

    /// Serialize operations on this session.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().await
    }

    pub async fn close(self) -> Result<(), RegistryError> {
        self.wallet.close().await?;
        tracing::info!(role = %self.role, address = %self.address, "wallet session closed");
        Ok(())
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("role", &self.role)
            .field("address", &self.address)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
