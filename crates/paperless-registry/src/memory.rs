//! In-process registry network: ledger, wallets and prover.
//!
//! Implements the registry contract's rules (nullifier set over
//! `(credentialId, salt)`, one DID per wallet, ban list, owner
//! initialisation, owner-only administration, revocation) so pipelines can
//! run end to end without a node, indexer or proof server.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{watch, Mutex};

use paperless_core::Bytes32;
use paperless_crypto::hashing;

use crate::contract::{
    BalancedTransaction, CircuitCall, Prover, ProvenTransaction, RegistryContract, RegistryQuery,
    SubmittedTransaction, UnprovenTransaction,
};
use crate::error::RegistryError;
use crate::request::RegistrationRequest;
use crate::wallet::{SyncProgress, Wallet, WalletProvider, WalletSeed, WalletState};

/// Fee charged per transaction accepted by the ledger.
pub const DEFAULT_FEE: u128 = 1_000;

/// Balance new wallets start with.
pub const DEFAULT_INITIAL_BALANCE: u128 = 1_000_000;

const SYNC_HEIGHT: u64 = 100;

fn concat_hash(parts: &[&[u8]]) -> [u8; 32] {
    hashing::sha256(&parts.concat())
}

#[derive(Debug, Clone)]
struct DidRecord {
    wallet_hash: Bytes32,
    credential_id: Bytes32,
}

#[derive(Debug, Default)]
struct LedgerState {
    owner: Option<Bytes32>,
    nullifiers: HashSet<Bytes32>,
    banned: HashSet<Bytes32>,
    dids: HashMap<Bytes32, DidRecord>,
    wallet_dids: HashMap<Bytes32, Bytes32>,
}

impl LedgerState {
    fn require_owner(&self, caller: &Bytes32) -> Result<(), String> {
        match self.owner {
            Some(owner) if owner == *caller => Ok(()),
            Some(_) => Err("Not authorized: caller is not the contract owner".into()),
            None => Err("Not authorized: contract owner not initialised".into()),
        }
    }

    fn register(&mut self, req: &RegistrationRequest) -> Result<Bytes32, String> {
        if !req.is_eligible {
            return Err("Not eligible".into());
        }
        if self.banned.contains(&req.credential_id) {
            return Err("Identity is banned".into());
        }
        let nullifier = hashing::nullifier(&req.credential_id, &req.salt);
        if self.nullifiers.contains(&nullifier) {
            return Err("Identity already registered".into());
        }
        if self.wallet_dids.contains_key(&req.wallet_hash) {
            return Err("Wallet already has a DID".into());
        }
        if req.is_owner_init {
            match self.owner {
                None => self.owner = Some(req.wallet_hash),
                Some(owner) if owner == req.wallet_hash => {}
                Some(_) => return Err("Contract owner already initialised".into()),
            }
        }

        let did = Bytes32(concat_hash(&[
            req.public_key.as_bytes(),
            req.wallet_hash.as_bytes(),
            nullifier.as_bytes(),
        ]));
        self.nullifiers.insert(nullifier);
        self.wallet_dids.insert(req.wallet_hash, did);
        self.dids.insert(
            did,
            DidRecord {
                wallet_hash: req.wallet_hash,
                credential_id: req.credential_id,
            },
        );
        Ok(did)
    }

    fn apply(&mut self, call: &CircuitCall) -> Result<Option<Bytes32>, String> {
        match call {
            CircuitCall::Register(req) => self.register(req).map(Some),
            CircuitCall::BanIdentity {
                admin_wallet_hash,
                identity_hash,
            } => {
                self.require_owner(admin_wallet_hash)?;
                self.banned.insert(*identity_hash);
                Ok(None)
            }
            CircuitCall::UnbanIdentity {
                admin_wallet_hash,
                identity_hash,
            } => {
                self.require_owner(admin_wallet_hash)?;
                self.banned.remove(identity_hash);
                Ok(None)
            }
            CircuitCall::RevokeDid {
                admin_wallet_hash,
                did,
            } => {
                self.require_owner(admin_wallet_hash)?;
                let record = self.dids.remove(did).ok_or("DID not found")?;
                self.wallet_dids.remove(&record.wallet_hash);
                tracing::debug!(credential = %record.credential_id.short(), "DID revoked");
                Ok(None)
            }
        }
    }
}

/// In-memory registry ledger. Also serves as the [`RegistryContract`].
pub struct InMemoryLedger {
    address: String,
    state: Mutex<LedgerState>,
    tx_counter: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_address(Bytes32::random().to_hex())
    }

    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: Mutex::new(LedgerState::default()),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Apply a proven transaction, as the network would on submission.
    pub async fn apply(&self, tx: &ProvenTransaction) -> Result<SubmittedTransaction, RegistryError> {
        let unproven = &tx.balanced.unproven;
        if unproven.contract_address != self.address {
            return Err(RegistryError::Registry(format!(
                "unknown contract address {}",
                unproven.contract_address
            )));
        }
        if tx.proof != InMemoryProver::proof_for(&tx.balanced)? {
            return Err(RegistryError::Registry("invalid proof".into()));
        }

        let result = {
            let mut state = self.state.lock().await;
            state.apply(&unproven.call).map_err(|msg| {
                tracing::warn!(circuit = unproven.call.circuit(), reason = %msg, "registry rejected call");
                RegistryError::classify(msg)
            })?
        };

        let sequence = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let tx_hash = hex::encode(concat_hash(&[&tx.proof, &sequence.to_be_bytes()]));
        tracing::debug!(circuit = unproven.call.circuit(), tx_hash = %tx_hash, "transaction applied");
        Ok(SubmittedTransaction { tx_hash, result })
    }

    pub async fn owner(&self) -> Option<Bytes32> {
        self.state.lock().await.owner
    }

    pub async fn did_count(&self) -> usize {
        self.state.lock().await.dids.len()
    }

    /// Number of transactions applied so far.
    pub fn transaction_count(&self) -> u64 {
        self.tx_counter.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryContract for InMemoryLedger {
    fn address(&self) -> &str {
        &self.address
    }

    async fn query(&self, query: RegistryQuery) -> Result<bool, RegistryError> {
        let state = self.state.lock().await;
        Ok(match query {
            RegistryQuery::IsIdentityBanned(identity) => state.banned.contains(&identity),
            RegistryQuery::DidExists(did) => state.dids.contains_key(&did),
            RegistryQuery::IsAuthenticated(wallet) => state.wallet_dids.contains_key(&wallet),
        })
    }
}

/// Deterministic stand-in prover.
#[derive(Debug, Default)]
pub struct InMemoryProver {
    failure: Option<String>,
}

impl InMemoryProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A prover that rejects every transaction with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
        }
    }

    /// Proof bytes the ledger expects for `tx`.
    pub fn proof_for(tx: &BalancedTransaction) -> Result<Vec<u8>, RegistryError> {
        let encoded = serde_json::to_vec(tx)
            .map_err(|e| RegistryError::ProofFailure(format!("cannot encode transaction: {e}")))?;
        Ok(hashing::sha256(&encoded).to_vec())
    }
}

#[async_trait]
impl Prover for InMemoryProver {
    async fn prove(&self, tx: BalancedTransaction) -> Result<ProvenTransaction, RegistryError> {
        if let Some(reason) = &self.failure {
            return Err(RegistryError::ProofFailure(reason.clone()));
        }
        let proof = Self::proof_for(&tx)?;
        Ok(ProvenTransaction { balanced: tx, proof })
    }
}

/// Wallet backed by an [`InMemoryLedger`].
pub struct InMemoryWallet {
    ledger: Arc<InMemoryLedger>,
    state_tx: Arc<watch::Sender<WalletState>>,
    sync_delay: Option<Duration>,
    fee: u128,
}

impl InMemoryWallet {
    fn new(ledger: Arc<InMemoryLedger>, seed: &WalletSeed, balance: u128, sync_delay: Option<Duration>) -> Self {
        let key = |context: &str| hex::encode(hashing::derive_key(context, seed.as_bytes()));
        let coin_public_key = key("paperless in-memory wallet 2024 coin public key");
        let state = WalletState {
            address: format!("addr_{}", &key("paperless in-memory wallet 2024 address")[..40]),
            coin_public_key,
            encryption_public_key: key("paperless in-memory wallet 2024 encryption public key"),
            sync_progress: SyncProgress {
                synced: false,
                applied_index: 0,
                highest_index: SYNC_HEIGHT,
            },
            balance,
        };
        let (state_tx, _) = watch::channel(state);
        Self {
            ledger,
            state_tx: Arc::new(state_tx),
            sync_delay,
            fee: DEFAULT_FEE,
        }
    }

    fn mark_synced(state_tx: &watch::Sender<WalletState>) {
        state_tx.send_modify(|state| {
            state.sync_progress.synced = true;
            state.sync_progress.applied_index = state.sync_progress.highest_index;
        });
    }

    fn credit(&self, amount: u128) {
        self.state_tx.send_modify(|state| state.balance += amount);
    }
}

#[async_trait]
impl Wallet for InMemoryWallet {
    fn state(&self) -> watch::Receiver<WalletState> {
        self.state_tx.subscribe()
    }

    async fn start(&self) -> Result<(), RegistryError> {
        match self.sync_delay {
            None => Self::mark_synced(&self.state_tx),
            Some(delay) => {
                let state_tx = self.state_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    Self::mark_synced(&state_tx);
                });
            }
        }
        Ok(())
    }

    async fn balance_transaction(
        &self,
        tx: UnprovenTransaction,
    ) -> Result<BalancedTransaction, RegistryError> {
        let fee = self.fee;
        if self.state_tx.borrow().balance < fee {
            return Err(RegistryError::Registry(
                "Insufficient funds to cover transaction fee".into(),
            ));
        }
        Ok(BalancedTransaction {
            unproven: tx,
            payer: self.state_tx.borrow().address.clone(),
            fee,
        })
    }

    async fn submit_transaction(
        &self,
        tx: ProvenTransaction,
    ) -> Result<SubmittedTransaction, RegistryError> {
        let submitted = self.ledger.apply(&tx).await?;
        let fee = tx.balanced.fee;
        self.state_tx
            .send_modify(|state| state.balance = state.balance.saturating_sub(fee));
        Ok(submitted)
    }

    async fn close(&self) -> Result<(), RegistryError> {
        Ok(())
    }
}

/// Builds [`InMemoryWallet`]s. The same seed always yields the same wallet.
pub struct InMemoryWalletProvider {
    ledger: Arc<InMemoryLedger>,
    initial_balance: u128,
    sync_delay: Option<Duration>,
    wallets: DashMap<String, Arc<InMemoryWallet>>,
}

impl InMemoryWalletProvider {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            ledger,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            sync_delay: None,
            wallets: DashMap::new(),
        }
    }

    pub fn with_initial_balance(mut self, balance: u128) -> Self {
        self.initial_balance = balance;
        self
    }

    /// Report synced only after `delay` once started.
    pub fn with_sync_delay(mut self, delay: Duration) -> Self {
        self.sync_delay = Some(delay);
        self
    }

    /// Credit a wallet, identified by its coin public key.
    pub fn fund(&self, coin_public_key: &str, amount: u128) -> bool {
        match self.wallets.get(coin_public_key) {
            Some(wallet) => {
                wallet.credit(amount);
                true
            }
            None => false,
        }
    }

    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }
}

#[async_trait]
impl WalletProvider for InMemoryWalletProvider {
    async fn build_from_seed(&self, seed: &WalletSeed) -> Result<Arc<dyn Wallet>, RegistryError> {
        let candidate = InMemoryWallet::new(
            self.ledger.clone(),
            seed,
            self.initial_balance,
            self.sync_delay,
        );
        let coin_public_key = candidate.state_tx.borrow().coin_public_key.clone();
        let wallet = self
            .wallets
            .entry(coin_public_key)
            .or_insert_with(|| Arc::new(candidate))
            .clone();
        Ok(wallet)
    }
}
