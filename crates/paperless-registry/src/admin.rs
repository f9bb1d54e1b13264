//! Owner-only administration and read-only registry queries.

use paperless_core::{Bytes32, Did};

use crate::contract::{CircuitCall, RegistryQuery};
use crate::error::RegistryError;
use crate::pipeline::TransactionResult;
use crate::service::RegistryClient;
use crate::wallet::WalletSession;

fn require_admin(session: &WalletSession, circuit: &str) -> Result<(), RegistryError> {
    if session.role().is_admin() {
        Ok(())
    } else {
        tracing::warn!(circuit, address = %session.address(), "admin operation refused for user session");
        Err(RegistryError::AdminRequired)
    }
}

impl RegistryClient {
    /// Add `identity_hash` to the ban list.
    pub async fn ban(
        &self,
        session: &WalletSession,
        identity_hash: Bytes32,
    ) -> Result<TransactionResult, RegistryError> {
        require_admin(session, "banIdentity")?;
        let call = CircuitCall::BanIdentity {
            admin_wallet_hash: session.wallet_hash(),
            identity_hash,
        };
        let result = self.submit_call(session, call).await?;
        tracing::info!(identity = %identity_hash.short(), "identity banned");
        Ok(result)
    }

    /// Remove `identity_hash` from the ban list.
    pub async fn unban(
        &self,
        session: &WalletSession,
        identity_hash: Bytes32,
    ) -> Result<TransactionResult, RegistryError> {
        require_admin(session, "unbanIdentity")?;
        let call = CircuitCall::UnbanIdentity {
            admin_wallet_hash: session.wallet_hash(),
            identity_hash,
        };
        let result = self.submit_call(session, call).await?;
        tracing::info!(identity = %identity_hash.short(), "identity unbanned");
        Ok(result)
    }

    /// Revoke an issued DID, freeing its wallet.
    pub async fn revoke(&self, session: &WalletSession, did: Did) -> Result<TransactionResult, RegistryError> {
        require_admin(session, "revokeDID")?;
        let call = CircuitCall::RevokeDid {
            admin_wallet_hash: session.wallet_hash(),
            did: did.0,
        };
        let result = self.submit_call(session, call).await?;
        tracing::info!(did = %did.uri(self.network()), "DID revoked");
        Ok(result)
    }

    pub async fn is_identity_banned(&self, identity_hash: Bytes32) -> Result<bool, RegistryError> {
        self.contract()
            .query(RegistryQuery::IsIdentityBanned(identity_hash))
            .await
    }

    pub async fn did_exists(&self, did: Did) -> Result<bool, RegistryError> {
        self.contract().query(RegistryQuery::DidExists(did.0)).await
    }

    /// Whether the wallet holds a DID.
    pub async fn is_authenticated(&self, wallet_hash: Bytes32) -> Result<bool, RegistryError> {
        self.contract()
            .query(RegistryQuery::IsAuthenticated(wallet_hash))
            .await
    }
}
