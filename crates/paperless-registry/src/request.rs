use serde::{Deserialize, Serialize};

use paperless_core::Bytes32;
use paperless_credentials::Witness;
use paperless_crypto::KeyPair;

use crate::wallet::WalletSession;

/// Inputs of the registry's `register` circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub credential_id: Bytes32,
    pub salt: Bytes32,
    pub is_eligible: bool,
    /// SHA-256 of the registering wallet's coin public key.
    pub wallet_hash: Bytes32,
    /// Verification key bound to the issued DID.
    pub public_key: Bytes32,
    /// Claim contract ownership. Set for admin-role sessions only.
    pub is_owner_init: bool,
}

impl RegistrationRequest {
    /// Build a request for `session`, binding a freshly generated
    /// verification key.
    pub fn new(witness: &Witness, session: &WalletSession) -> Self {
        let verification_key = KeyPair::generate();
        Self::with_public_key(witness, session, Bytes32(*verification_key.public_key().as_bytes()))
    }

    pub fn with_public_key(witness: &Witness, session: &WalletSession, public_key: Bytes32) -> Self {
        Self {
            credential_id: *witness.credential_id(),
            salt: *witness.salt(),
            is_eligible: witness.is_eligible(),
            wallet_hash: session.wallet_hash(),
            public_key,
            is_owner_init: session.role().is_admin(),
        }
    }
}
