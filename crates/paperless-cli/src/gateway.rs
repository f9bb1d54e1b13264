//! HTTP/JSON client for the registry gateway.
//!
//! The gateway fronts the wallet backend, the proof server and the deployed
//! registry contract. Each is exposed here behind the trait the pipeline
//! already consumes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use paperless_core::NetworkConfig;
use paperless_registry::{
    BalancedTransaction, Prover, ProvenTransaction, RegistryContract, RegistryError, RegistryQuery,
    SubmittedTransaction, UnprovenTransaction, Wallet, WalletProvider, WalletSeed, WalletState,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct BuildWalletRequest<'a> {
    seed: String,
    /// Endpoints the gateway syncs the wallet against.
    network: &'a NetworkConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildWalletResponse {
    wallet_id: String,
    state: WalletState,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: bool,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

enum CallError {
    Transport(String),
    Rejected(String),
}

impl CallError {
    fn into_registry(self) -> RegistryError {
        match self {
            Self::Transport(msg) => RegistryError::Transport(msg),
            Self::Rejected(msg) => RegistryError::classify(msg),
        }
    }

    fn into_proof(self) -> RegistryError {
        match self {
            Self::Transport(msg) => RegistryError::Transport(msg),
            Self::Rejected(msg) => RegistryError::ProofFailure(msg),
        }
    }
}

/// Connection to a registry gateway.
#[derive(Clone)]
pub struct GatewayClient {
    base: String,
    http: reqwest::Client,
    poll_interval: Duration,
    network: NetworkConfig,
}

impl GatewayClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            http: reqwest::Client::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            network: NetworkConfig::default(),
        }
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// How often started wallets refresh their state.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn contract(&self, address: impl Into<String>) -> GatewayContract {
        GatewayContract {
            client: self.clone(),
            address: address.into(),
        }
    }

    pub fn prover(&self) -> GatewayProver {
        GatewayProver {
            client: self.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), path)
    }

    async fn send<R: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<R, CallError> {
        let resp = request
            .send()
            .await
            .map_err(|e| CallError::Transport(format!("gateway unreachable at {}: {e}", self.base)))?;
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<R>()
                .await
                .map_err(|e| CallError::Transport(format!("invalid gateway response: {e}")));
        }
        let message = match resp.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("gateway returned HTTP {status}"),
        };
        if status.is_server_error() && status != reqwest::StatusCode::INTERNAL_SERVER_ERROR {
            Err(CallError::Transport(message))
        } else {
            Err(CallError::Rejected(message))
        }
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, CallError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, CallError> {
        self.send(self.http.get(self.url(path))).await
    }
}

/// Wallet hosted by the gateway. Its state is refreshed by polling once
/// started.
pub struct GatewayWallet {
    client: GatewayClient,
    id: String,
    state_tx: Arc<watch::Sender<WalletState>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl GatewayWallet {
    async fn refresh(client: &GatewayClient, id: &str, state_tx: &watch::Sender<WalletState>) {
        match client.get::<WalletState>(&format!("wallets/{id}/state")).await {
            Ok(latest) => {
                state_tx.send_if_modified(|current| {
                    if *current == latest {
                        false
                    } else {
                        *current = latest;
                        true
                    }
                });
            }
            Err(CallError::Transport(msg)) | Err(CallError::Rejected(msg)) => {
                tracing::warn!(wallet = %id, error = %msg, "wallet state refresh failed");
            }
        }
    }
}

#[async_trait]
impl Wallet for GatewayWallet {
    fn state(&self) -> watch::Receiver<WalletState> {
        self.state_tx.subscribe()
    }

    async fn start(&self) -> Result<(), RegistryError> {
        self.client
            .post::<_, serde_json::Value>(&format!("wallets/{}/start", self.id), &serde_json::json!({}))
            .await
            .map_err(CallError::into_registry)?;
        Self::refresh(&self.client, &self.id, &self.state_tx).await;

        let client = self.client.clone();
        let id = self.id.clone();
        let state_tx = self.state_tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(client.poll_interval);
            loop {
                ticker.tick().await;
                Self::refresh(&client, &id, &state_tx).await;
            }
        });
        if let Some(previous) = self.poller.lock().await.replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    async fn balance_transaction(
        &self,
        tx: UnprovenTransaction,
    ) -> Result<BalancedTransaction, RegistryError> {
        self.client
            .post(&format!("wallets/{}/balance", self.id), &tx)
            .await
            .map_err(CallError::into_registry)
    }

    async fn submit_transaction(
        &self,
        tx: ProvenTransaction,
    ) -> Result<SubmittedTransaction, RegistryError> {
        self.client
            .post(&format!("wallets/{}/submit", self.id), &tx)
            .await
            .map_err(CallError::into_registry)
    }

    async fn close(&self) -> Result<(), RegistryError> {
        if let Some(handle) = self.poller.lock().await.take() {
            handle.abort();
        }
        self.client
            .send::<serde_json::Value>(
                self.client
                    .http
                    .delete(self.client.url(&format!("wallets/{}", self.id))),
            )
            .await
            .map_err(CallError::into_registry)?;
        Ok(())
    }
}

impl Drop for GatewayWallet {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.get_mut().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl WalletProvider for GatewayClient {
    async fn build_from_seed(&self, seed: &WalletSeed) -> Result<Arc<dyn Wallet>, RegistryError> {
        let request = BuildWalletRequest {
            seed: seed.to_hex(),
            network: &self.network,
        };
        let built: BuildWalletResponse = self
            .post("wallets", &request)
            .await
            .map_err(CallError::into_registry)?;
        tracing::debug!(wallet = %built.wallet_id, address = %built.state.address, "gateway wallet built");
        let (state_tx, _) = watch::channel(built.state);
        Ok(Arc::new(GatewayWallet {
            client: self.clone(),
            id: built.wallet_id,
            state_tx: Arc::new(state_tx),
            poller: Mutex::new(None),
        }))
    }
}

/// Registry contract reached through the gateway.
pub struct GatewayContract {
    client: GatewayClient,
    address: String,
}

#[async_trait]
impl RegistryContract for GatewayContract {
    fn address(&self) -> &str {
        &self.address
    }

    async fn query(&self, query: RegistryQuery) -> Result<bool, RegistryError> {
        let resp: QueryResponse = self
            .client
            .post(&format!("contracts/{}/query", self.address), &query)
            .await
            .map_err(CallError::into_registry)?;
        Ok(resp.result)
    }
}

/// Proof server reached through the gateway.
pub struct GatewayProver {
    client: GatewayClient,
}

#[async_trait]
impl Prover for GatewayProver {
    async fn prove(&self, tx: BalancedTransaction) -> Result<ProvenTransaction, RegistryError> {
        self.client
            .post("prove", &tx)
            .await
            .map_err(CallError::into_proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};

    use paperless_core::{Bytes32, TxStage, WalletRole};
    use paperless_credentials::{StudentCredential, Witness};
    use paperless_registry::{
        InMemoryLedger, InMemoryProver, InMemoryWalletProvider, RegistryClient, WalletSession,
    };

    struct Backend {
        ledger: Arc<InMemoryLedger>,
        provider: InMemoryWalletProvider,
        prover: InMemoryProver,
        wallets: Mutex<HashMap<String, Arc<dyn Wallet>>>,
    }

    type Shared = State<Arc<Backend>>;
    type Reply<T> = Result<Json<T>, (StatusCode, Json<serde_json::Value>)>;

    fn rejected(e: RegistryError) -> (StatusCode, Json<serde_json::Value>) {
        let status = match e {
            RegistryError::ProofFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        };
        let message = match e {
            RegistryError::Registry(msg) => msg,
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message })))
    }

    async fn wallet(backend: &Backend, id: &str) -> Arc<dyn Wallet> {
        backend.wallets.lock().await[id].clone()
    }

    async fn build(State(b): Shared, Json(body): Json<serde_json::Value>) -> Reply<serde_json::Value> {
        if body["network"]["proof_server"].as_str().is_none() {
            return Err((StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "network missing" }))));
        }
        let seed = WalletSeed::from_hex(body["seed"].as_str().unwrap_or_default()).map_err(rejected)?;
        let wallet = b.provider.build_from_seed(&seed).await.map_err(rejected)?;
        let state = wallet.state().borrow().clone();
        b.wallets
            .lock()
            .await
            .insert(state.coin_public_key.clone(), wallet);
        Ok(Json(serde_json::json!({ "walletId": state.coin_public_key, "state": state })))
    }

    async fn start(State(b): Shared, Path(id): Path<String>) -> Reply<serde_json::Value> {
        wallet(&b, &id).await.start().await.map_err(rejected)?;
        Ok(Json(serde_json::json!({})))
    }

    async fn state(State(b): Shared, Path(id): Path<String>) -> Json<WalletState> {
        Json(wallet(&b, &id).await.state().borrow().clone())
    }

    async fn balance(
        State(b): Shared,
        Path(id): Path<String>,
        Json(tx): Json<UnprovenTransaction>,
    ) -> Reply<BalancedTransaction> {
        Ok(Json(wallet(&b, &id).await.balance_transaction(tx).await.map_err(rejected)?))
    }

    async fn submit(
        State(b): Shared,
        Path(id): Path<String>,
        Json(tx): Json<ProvenTransaction>,
    ) -> Reply<SubmittedTransaction> {
        Ok(Json(wallet(&b, &id).await.submit_transaction(tx).await.map_err(rejected)?))
    }

    async fn remove(State(b): Shared, Path(id): Path<String>) -> Json<serde_json::Value> {
        b.wallets.lock().await.remove(&id);
        Json(serde_json::json!({}))
    }

    async fn prove(State(b): Shared, Json(tx): Json<BalancedTransaction>) -> Reply<ProvenTransaction> {
        Ok(Json(b.prover.prove(tx).await.map_err(rejected)?))
    }

    async fn query(
        State(b): Shared,
        Path(_address): Path<String>,
        Json(q): Json<RegistryQuery>,
    ) -> Reply<serde_json::Value> {
        let result = b.ledger.query(q).await.map_err(rejected)?;
        Ok(Json(serde_json::json!({ "result": result })))
    }

    async fn spawn_gateway(prover: InMemoryProver) -> (String, Arc<InMemoryLedger>) {
        let ledger = Arc::new(InMemoryLedger::with_address("registry-under-test"));
        let backend = Arc::new(Backend {
            ledger: ledger.clone(),
            provider: InMemoryWalletProvider::new(ledger.clone()),
            prover,
            wallets: Mutex::new(HashMap::new()),
        });
        let app = Router::new()
            .route("/wallets", post(build))
            .route("/wallets/{id}", delete(remove))
            .route("/wallets/{id}/start", post(start))
            .route("/wallets/{id}/state", get(state))
            .route("/wallets/{id}/balance", post(balance))
            .route("/wallets/{id}/submit", post(submit))
            .route("/prove", post(prove))
            .route("/contracts/{address}/query", post(query))
            .with_state(backend);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), ledger)
    }

    fn witness(id: u8) -> Witness {
        Witness {
            student_credential: StudentCredential {
                id: Bytes32([id; 32]),
                is_eligible: true,
                salt: Bytes32::random(),
            },
            issuer_signature: vec![0x5a; 64],
        }
    }

    fn registry(gateway: &GatewayClient, address: &str) -> RegistryClient {
        RegistryClient::new(
            Arc::new(gateway.contract(address)),
            Arc::new(gateway.prover()),
        )
    }

    #[tokio::test]
    async fn test_register_and_administer_through_gateway() {
        let (base, ledger) = spawn_gateway(InMemoryProver::new()).await;
        let gateway = GatewayClient::new(base)
            .with_poll_interval(Duration::from_millis(10))
            .with_network(NetworkConfig::local());
        let client = registry(&gateway, "registry-under-test");

        let admin = WalletSession::open(&gateway, &WalletSeed::from_bytes([1; 32]), WalletRole::Admin)
            .await
            .unwrap();
        admin.await_ready_timeout(Duration::from_secs(5)).await.unwrap();
        let registered = client.register(&admin, &witness(1)).await.unwrap();
        assert_eq!(registered.stages, TxStage::SUCCESS_PATH.to_vec());
        assert_eq!(ledger.owner().await, Some(admin.wallet_hash()));

        let identity = Bytes32([2; 32]);
        client.ban(&admin, identity).await.unwrap();
        assert!(client.is_identity_banned(identity).await.unwrap());

        let user = WalletSession::open(&gateway, &WalletSeed::random(), WalletRole::User)
            .await
            .unwrap();
        user.await_ready_timeout(Duration::from_secs(5)).await.unwrap();
        let err = client.register(&user, &witness(2)).await.unwrap_err();
        assert!(matches!(err, RegistryError::IdentityBanned(_)));

        let did = registered.issued_did.unwrap();
        assert!(client.did_exists(did).await.unwrap());
        admin.close().await.unwrap();
        user.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejections_are_classified() {
        let (base, _ledger) = spawn_gateway(InMemoryProver::new()).await;
        let gateway = GatewayClient::new(base).with_poll_interval(Duration::from_millis(10));
        let client = registry(&gateway, "registry-under-test");

        let user = WalletSession::open(&gateway, &WalletSeed::random(), WalletRole::User)
            .await
            .unwrap();
        user.await_ready_timeout(Duration::from_secs(5)).await.unwrap();
        client.register(&user, &witness(3)).await.unwrap();

        let err = client.register(&user, &witness(4)).await.unwrap_err();
        assert!(matches!(err, RegistryError::WalletAlreadyHasDid(_)));
    }

    #[tokio::test]
    async fn test_prover_rejection_is_proof_failure() {
        let (base, _ledger) = spawn_gateway(InMemoryProver::failing("out of memory")).await;
        let gateway = GatewayClient::new(base).with_poll_interval(Duration::from_millis(10));
        let client = registry(&gateway, "registry-under-test");

        let user = WalletSession::open(&gateway, &WalletSeed::random(), WalletRole::User)
            .await
            .unwrap();
        user.await_ready_timeout(Duration::from_secs(5)).await.unwrap();
        let err = client.register(&user, &witness(5)).await.unwrap_err();
        assert!(matches!(err, RegistryError::ProofFailure(_)));
    }

    #[tokio::test]
    async fn test_dropped_wallet_stops_polling() {
        let (base, _ledger) = spawn_gateway(InMemoryProver::new()).await;
        let gateway = GatewayClient::new(base).with_poll_interval(Duration::from_millis(10));
        let wallet = gateway
            .build_from_seed(&WalletSeed::from_bytes([7; 32]))
            .await
            .unwrap();
        wallet.start().await.unwrap();
        let mut rx = wallet.state();
        drop(wallet);

        // The poller holds the last sender; the channel only closes once it is gone.
        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            while rx.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        let gateway = GatewayClient::new("http://127.0.0.1:9");
        let err = WalletSession::open(&gateway, &WalletSeed::random(), WalletRole::User)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Transport(_)));
    }
}
