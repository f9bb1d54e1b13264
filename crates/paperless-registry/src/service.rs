use std::sync::Arc;

use paperless_core::Did;
use paperless_credentials::Witness;

use crate::contract::{CircuitCall, Prover, RegistryContract};
use crate::error::RegistryError;
use crate::pipeline::{Pipeline, TransactionResult};
use crate::request::RegistrationRequest;
use crate::wallet::WalletSession;

/// Registry client: the contract handle and prover shared by every
/// operation, plus the network name DIDs are rendered under.
#[derive(Clone)]
pub struct RegistryClient {
    contract: Arc<dyn RegistryContract>,
    prover: Arc<dyn Prover>,
    network: String,
}

impl RegistryClient {
    pub fn new(contract: Arc<dyn RegistryContract>, prover: Arc<dyn Prover>) -> Self {
        Self {
            contract,
            prover,
            network: "testnet".into(),
        }
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    pub fn contract(&self) -> &dyn RegistryContract {
        self.contract.as_ref()
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// `did:midnight:<network>:<hex>` for `did`.
    pub fn did_uri(&self, did: &Did) -> String {
        did.uri(&self.network)
    }

    /// Register `witness` for the session's wallet.
    ///
    /// Retries exactly once with a fresh salt when the registry reports the
    /// `(credentialId, salt)` pair as already used. Every other failure is
    /// returned as is.
    pub async fn register(
        &self,
        session: &WalletSession,
        witness: &Witness,
    ) -> Result<TransactionResult, RegistryError> {
        let _guard = session.lock().await;
        ensure_ready(session)?;

        let first = self.run_registration(session, witness).await;
        if !first.error_kind.is_some_and(|kind| kind.is_retryable()) {
            return first.into_result();
        }

        tracing::info!(
            credential = %witness.credential_id().short(),
            "credential and salt already used; retrying with a fresh salt"
        );
        let mut second = self
            .run_registration(session, &witness.with_fresh_salt())
            .await;
        second.attempts = 2;
        second.into_result()
    }

    /// Single registration attempt with the witness's own salt.
    pub async fn register_once(
        &self,
        session: &WalletSession,
        witness: &Witness,
    ) -> Result<TransactionResult, RegistryError> {
        let _guard = session.lock().await;
        ensure_ready(session)?;
        self.run_registration(session, witness).await.into_result()
    }

    /// Run an arbitrary call through the pipeline while holding the session.
    pub(crate) async fn submit_call(
        &self,
        session: &WalletSession,
        call: CircuitCall,
    ) -> Result<TransactionResult, RegistryError> {
        let _guard = session.lock().await;
        ensure_ready(session)?;
        Pipeline::new(session, self.prover.as_ref())
            .run(self.contract.as_ref(), call)
            .await
            .into_result()
    }

    async fn run_registration(&self, session: &WalletSession, witness: &Witness) -> TransactionResult {
        let request = RegistrationRequest::new(witness, session);
        tracing::debug!(
            credential = %request.credential_id.short(),
            wallet = %request.wallet_hash.short(),
            owner_init = request.is_owner_init,
            "submitting registration"
        );
        Pipeline::new(session, self.prover.as_ref())
            .run(self.contract.as_ref(), CircuitCall::Register(request))
            .await
    }
}

fn ensure_ready(session: &WalletSession) -> Result<(), RegistryError> {
    if session.is_ready() {
        Ok(())
    } else {
        Err(RegistryError::WalletNotReady)
    }
}
