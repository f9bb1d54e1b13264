//! Integration test: a verified offline KYC document carried through the
//! build → balance → prove → submit pipeline against the in-memory ledger.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use paperless_core::{ErrorKind, TxStage, WalletRole};
use paperless_credentials::{verify_with_store, KycBundle, Witness, WitnessBuilder};
use paperless_integration_tests::*;
use paperless_registry::{
    InMemoryLedger, InMemoryProver, InMemoryWalletProvider, RegistryClient, RegistryContract,
    RegistryQuery, WalletSeed, WalletSession,
};

struct Network {
    ledger: Arc<InMemoryLedger>,
    provider: InMemoryWalletProvider,
    client: RegistryClient,
}

fn network() -> Network {
    let ledger = Arc::new(InMemoryLedger::new());
    let provider = InMemoryWalletProvider::new(ledger.clone());
    let client = RegistryClient::new(ledger.clone(), Arc::new(InMemoryProver::new()));
    Network {
        ledger,
        provider,
        client,
    }
}

async fn ready_session(net: &Network, role: WalletRole) -> WalletSession {
    let session = WalletSession::open(&net.provider, &WalletSeed::random(), role)
        .await
        .unwrap();
    session.await_ready().await.unwrap();
    session
}

fn sample_witness() -> Witness {
    let doc = KycBundle::new(sample_archive()).extract(SHARE_CODE).unwrap();
    let outcome = verify_with_store(&doc, &issuer_store());
    WitnessBuilder::offline()
        .with_reference_date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
        .build(&doc, &outcome)
        .unwrap()
}

// =========================================================================
// Registration
// =========================================================================

#[tokio::test]
async fn test_archive_to_did() {
    let net = network();
    let user = ready_session(&net, WalletRole::User).await;
    let balance_before = user.state().balance;

    let result = net.client.register(&user, &sample_witness()).await.unwrap();
    assert!(result.is_confirmed());
    assert_eq!(result.stages, TxStage::SUCCESS_PATH.to_vec());
    assert!(result.tx_hash.is_some());

    let did = result.issued_did.unwrap();
    assert!(net.client.did_exists(did).await.unwrap());
    assert!(net.client.is_authenticated(user.wallet_hash()).await.unwrap());
    assert_eq!(net.ledger.did_count().await, 1);
    assert!(user.state().balance < balance_before);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["stage"], "Confirmed");
    assert_eq!(json["circuit"], "register");

    user.close().await.unwrap();
}

#[tokio::test]
async fn test_same_identifier_and_salt_rejected() {
    let net = network();
    let first = ready_session(&net, WalletRole::User).await;
    let second = ready_session(&net, WalletRole::User).await;
    let witness = sample_witness();

    net.client.register(&first, &witness).await.unwrap();

    let err = net.client.register_once(&second, &witness).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IdentifierAlreadyRegistered);
    assert!(!net.client.is_authenticated(second.wallet_hash()).await.unwrap());

    // A fresh salt yields a fresh nullifier.
    let retried = net.client.register(&second, &witness).await.unwrap();
    assert_eq!(retried.attempts, 2);
    assert_eq!(net.ledger.did_count().await, 2);
}

#[tokio::test]
async fn test_wallet_cannot_hold_two_dids() {
    let net = network();
    let user = ready_session(&net, WalletRole::User).await;

    net.client.register(&user, &sample_witness()).await.unwrap();
    let err = net.client.register(&user, &sample_witness()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WalletAlreadyHasDid);
}

#[tokio::test]
async fn test_registration_waits_for_sync() {
    let ledger = Arc::new(InMemoryLedger::new());
    let provider =
        InMemoryWalletProvider::new(ledger.clone()).with_sync_delay(Duration::from_millis(50));
    let client = RegistryClient::new(ledger.clone(), Arc::new(InMemoryProver::new()));

    let user = WalletSession::open(&provider, &WalletSeed::random(), WalletRole::User)
        .await
        .unwrap();
    user.await_ready_timeout(Duration::from_secs(5)).await.unwrap();

    let result = client.register(&user, &sample_witness()).await.unwrap();
    assert!(result.is_confirmed());
}

// =========================================================================
// Administration
// =========================================================================

#[tokio::test]
async fn test_ban_unban_and_revoke() {
    let net = network();
    let admin = ready_session(&net, WalletRole::Admin).await;
    let owner_witness = Witness {
        student_credential: paperless_credentials::StudentCredential {
            id: paperless_core::Bytes32([0xad; 32]),
            is_eligible: true,
            salt: paperless_core::Bytes32::random(),
        },
        issuer_signature: vec![0; 64],
    };
    net.client.register(&admin, &owner_witness).await.unwrap();
    assert_eq!(net.ledger.owner().await, Some(admin.wallet_hash()));

    let witness = sample_witness();
    let identity = *witness.credential_id();
    net.client.ban(&admin, identity).await.unwrap();
    assert!(net
        .ledger
        .query(RegistryQuery::IsIdentityBanned(identity))
        .await
        .unwrap());

    let user = ready_session(&net, WalletRole::User).await;
    let err = net.client.register(&user, &witness).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IdentityBanned);

    net.client.unban(&admin, identity).await.unwrap();
    assert!(!net.client.is_identity_banned(identity).await.unwrap());
    let did = net
        .client
        .register(&user, &witness)
        .await
        .unwrap()
        .issued_did
        .unwrap();

    net.client.revoke(&admin, did).await.unwrap();
    assert!(!net.client.did_exists(did).await.unwrap());
    assert!(!net.client.is_authenticated(user.wallet_hash()).await.unwrap());
}

#[tokio::test]
async fn test_owner_registration_and_ban_share_one_session() {
    let net = network();
    let admin = ready_session(&net, WalletRole::Admin).await;
    let owner_witness = Witness {
        student_credential: paperless_credentials::StudentCredential {
            id: paperless_core::Bytes32([0xad; 32]),
            is_eligible: true,
            salt: paperless_core::Bytes32::random(),
        },
        issuer_signature: vec![0; 64],
    };
    let identity = *sample_witness().credential_id();

    // The ban waits for the session, so it runs against an initialised owner.
    let (registered, banned) = tokio::join!(
        net.client.register(&admin, &owner_witness),
        net.client.ban(&admin, identity),
    );
    assert!(registered.unwrap().is_confirmed());
    let banned = banned.unwrap();
    assert_eq!(banned.stages, TxStage::SUCCESS_PATH.to_vec());
    assert_eq!(banned.circuit, "banIdentity");
    assert!(net.client.is_identity_banned(identity).await.unwrap());
    assert_eq!(net.ledger.transaction_count(), 2);
}

#[tokio::test]
async fn test_concurrent_registrations_leave_one_did() {
    let net = network();
    let user = ready_session(&net, WalletRole::User).await;
    let witness = sample_witness();
    let witness2 = sample_witness();

    let (a, b) = tokio::join!(
        net.client.register(&user, &witness),
        net.client.register(&user, &witness2),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let err = a.err().or(b.err()).unwrap();
    assert_eq!(err.kind(), ErrorKind::WalletAlreadyHasDid);
    assert_eq!(net.ledger.did_count().await, 1);
    assert!(net.client.is_authenticated(user.wallet_hash()).await.unwrap());
}

#[tokio::test]
async fn test_admin_operations_need_admin_session() {
    let net = network();
    let user = ready_session(&net, WalletRole::User).await;
    let identity = *sample_witness().credential_id();

    let err = net.client.ban(&user, identity).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AdminRequired);
    assert_eq!(net.ledger.transaction_count(), 0);
}
