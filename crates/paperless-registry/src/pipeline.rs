use serde::Serialize;

use paperless_core::{Did, ErrorKind, TxStage, TxStageMachine};

use crate::contract::{
    BalancedTransaction, CircuitCall, Prover, ProvenTransaction, RegistryContract,
    SubmittedTransaction, UnprovenTransaction,
};
use crate::error::RegistryError;
use crate::wallet::WalletSession;

/// A transaction at one stage of its lifecycle, carrying that stage's data.
#[derive(Debug)]
pub enum PipelineState {
    Built(UnprovenTransaction),
    Balanced(BalancedTransaction),
    Proven(ProvenTransaction),
    Submitted(SubmittedTransaction),
    Confirmed {
        tx_hash: String,
        issued_did: Option<Did>,
    },
    Failed(RegistryError),
}

impl PipelineState {
    pub fn stage(&self) -> TxStage {
        match self {
            Self::Built(_) => TxStage::Built,
            Self::Balanced(_) => TxStage::Balanced,
            Self::Proven(_) => TxStage::Proven,
            Self::Submitted(_) => TxStage::Submitted,
            Self::Confirmed { .. } => TxStage::Confirmed,
            Self::Failed(_) => TxStage::Failed,
        }
    }
}

/// Final report of one pipeline run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub circuit: &'static str,
    /// Final stage: `Confirmed` or `Failed`.
    pub stage: TxStage,
    /// Every stage visited, in order.
    pub stages: Vec<TxStage>,
    pub tx_hash: Option<String>,
    pub issued_did: Option<Did>,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
    /// Pipeline runs it took; more than one when a registration was retried.
    pub attempts: u32,
    #[serde(skip)]
    failure: Option<RegistryError>,
}

impl TransactionResult {
    fn finish(circuit: &'static str, stages: Vec<TxStage>, state: PipelineState) -> Self {
        let mut result = Self {
            circuit,
            stage: state.stage(),
            stages,
            tx_hash: None,
            issued_did: None,
            error_kind: None,
            error: None,
            attempts: 1,
            failure: None,
        };
        match state {
            PipelineState::Confirmed {
                tx_hash,
                issued_did,
            } => {
                result.tx_hash = Some(tx_hash);
                result.issued_did = issued_did;
            }
            PipelineState::Failed(err) => {
                result.error_kind = Some(err.kind());
                result.error = Some(err.to_string());
                result.failure = Some(err);
            }
            other => {
                let err = RegistryError::InvalidInput(format!(
                    "pipeline stopped at non-final stage {}",
                    other.stage()
                ));
                result.stage = TxStage::Failed;
                result.error_kind = Some(err.kind());
                result.error = Some(err.to_string());
                result.failure = Some(err);
            }
        }
        result
    }

    pub fn is_confirmed(&self) -> bool {
        self.stage == TxStage::Confirmed
    }

    pub fn failure(&self) -> Option<&RegistryError> {
        self.failure.as_ref()
    }

    /// `Err` with the typed failure when the run did not confirm.
    pub fn into_result(mut self) -> Result<Self, RegistryError> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Drives a transaction one stage at a time, using a session's wallet for
/// balancing and submission and an external prover for proofs.
pub struct Pipeline<'a> {
    session: &'a WalletSession,
    prover: &'a dyn Prover,
}

impl<'a> Pipeline<'a> {
    pub fn new(session: &'a WalletSession, prover: &'a dyn Prover) -> Self {
        Self { session, prover }
    }

    /// Advance by exactly one stage. Final states are returned unchanged.
    pub async fn step(&self, state: PipelineState) -> PipelineState {
        let current = state.stage();
        let next = match state {
            PipelineState::Built(tx) => {
                if !self.session.is_ready() {
                    PipelineState::Failed(RegistryError::WalletNotReady)
                } else {
                    match self.session.wallet().balance_transaction(tx).await {
                        Ok(balanced) => PipelineState::Balanced(balanced),
                        Err(e) => PipelineState::Failed(e),
                    }
                }
            }
            PipelineState::Balanced(tx) => match self.prover.prove(tx).await {
                Ok(proven) => PipelineState::Proven(proven),
                Err(RegistryError::ProofFailure(msg)) => {
                    PipelineState::Failed(RegistryError::ProofFailure(msg))
                }
                Err(e) => PipelineState::Failed(RegistryError::ProofFailure(e.to_string())),
            },
            PipelineState::Proven(tx) => match self.session.wallet().submit_transaction(tx).await {
                Ok(submitted) => PipelineState::Submitted(submitted),
                Err(e) => PipelineState::Failed(e),
            },
            PipelineState::Submitted(submitted) => PipelineState::Confirmed {
                tx_hash: submitted.tx_hash,
                issued_did: submitted.result.map(Did),
            },
            final_state => return final_state,
        };

        match TxStageMachine::transition(current, next.stage()) {
            Ok(stage) => {
                match &next {
                    PipelineState::Failed(err) => {
                        tracing::warn!(from = %current, kind = %err.kind(), error = %err, "transaction failed")
                    }
                    _ => tracing::debug!(from = %current, to = %stage, "transaction stage"),
                }
                next
            }
            Err(e) => PipelineState::Failed(e.into()),
        }
    }

    /// Build `call` against `contract` and drive it to a final stage.
    pub async fn run(&self, contract: &dyn RegistryContract, call: CircuitCall) -> TransactionResult {
        let circuit = call.circuit();
        let mut state = PipelineState::Built(contract.build(call));
        let mut stages = vec![TxStage::Built];
        while !state.stage().is_final() {
            state = self.step(state).await;
            stages.push(state.stage());
        }
        let result = TransactionResult::finish(circuit, stages, state);
        if result.is_confirmed() {
            tracing::info!(
                circuit,
                tx_hash = result.tx_hash.as_deref().unwrap_or_default(),
                "transaction confirmed"
            );
        }
        result
    }
}
