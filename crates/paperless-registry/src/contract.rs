use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use paperless_core::Bytes32;

use crate::error::RegistryError;
use crate::request::RegistrationRequest;

/// A state-changing call against one of the registry's circuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "circuit", rename_all = "camelCase")]
pub enum CircuitCall {
    Register(RegistrationRequest),
    #[serde(rename_all = "camelCase")]
    BanIdentity {
        admin_wallet_hash: Bytes32,
        identity_hash: Bytes32,
    },
    #[serde(rename_all = "camelCase")]
    UnbanIdentity {
        admin_wallet_hash: Bytes32,
        identity_hash: Bytes32,
    },
    #[serde(rename = "revokeDID", rename_all = "camelCase")]
    RevokeDid {
        admin_wallet_hash: Bytes32,
        did: Bytes32,
    },
}

impl CircuitCall {
    /// Circuit entry-point name.
    pub fn circuit(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::BanIdentity { .. } => "banIdentity",
            Self::UnbanIdentity { .. } => "unbanIdentity",
            Self::RevokeDid { .. } => "revokeDID",
        }
    }

    /// Whether only the contract owner may make this call.
    pub fn is_admin_only(&self) -> bool {
        !matches!(self, Self::Register(_))
    }
}

/// A read-only registry query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "circuit", content = "argument", rename_all = "camelCase")]
pub enum RegistryQuery {
    IsIdentityBanned(Bytes32),
    DidExists(Bytes32),
    IsAuthenticated(Bytes32),
}

/// Call constructed against a circuit, not yet funded or proven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnprovenTransaction {
    pub contract_address: String,
    pub call: CircuitCall,
}

/// Transaction with fee inputs contributed by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancedTransaction {
    pub unproven: UnprovenTransaction,
    /// Address of the wallet paying the fee.
    pub payer: String,
    pub fee: u128,
}

/// Balanced transaction with its zero-knowledge proof attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenTransaction {
    pub balanced: BalancedTransaction,
    #[serde(with = "hex_vec")]
    pub proof: Vec<u8>,
}

/// Handle returned by the network for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTransaction {
    pub tx_hash: String,
    /// Circuit return value, when the circuit returns one (the issued DID
    /// for `register`).
    pub result: Option<Bytes32>,
}

mod hex_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// The deployed registry contract.
#[async_trait]
pub trait RegistryContract: Send + Sync {
    /// Deployed contract address.
    fn address(&self) -> &str;

    /// Translate a call into an unproven transaction. Pure construction.
    fn build(&self, call: CircuitCall) -> UnprovenTransaction {
        UnprovenTransaction {
            contract_address: self.address().to_string(),
            call,
        }
    }

    /// Evaluate a read-only circuit.
    async fn query(&self, query: RegistryQuery) -> Result<bool, RegistryError>;
}

/// Opaque zero-knowledge prover.
#[async_trait]
pub trait Prover: Send + Sync {
    /// Attach a proof. Failures surface as [`RegistryError::ProofFailure`].
    async fn prove(&self, tx: BalancedTransaction) -> Result<ProvenTransaction, RegistryError>;
}
