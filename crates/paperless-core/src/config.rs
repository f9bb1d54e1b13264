use serde::{Deserialize, Serialize};

/// Endpoints of the registry network a wallet synchronizes against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network display name; also the DID URI network segment.
    pub name: String,
    /// Indexer GraphQL endpoint.
    pub indexer: String,
    /// Indexer GraphQL websocket endpoint.
    pub indexer_ws: String,
    /// Node RPC endpoint.
    pub node: String,
    /// Proof server endpoint.
    pub proof_server: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

impl NetworkConfig {
    /// Public testnet endpoints. The proof server honours `PROOF_SERVER_URL`.
    pub fn testnet() -> Self {
        let proof_server = std::env::var("PROOF_SERVER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:6300".into());
        Self {
            name: "testnet".into(),
            indexer: "https://indexer.testnet-02.midnight.network/api/v1/graphql".into(),
            indexer_ws: "wss://indexer.testnet-02.midnight.network/api/v1/graphql/ws".into(),
            node: "https://rpc.testnet-02.midnight.network".into(),
            proof_server,
        }
    }

    /// Look up a known network by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "testnet" => Some(Self::testnet()),
            "local" | "undeployed" => Some(Self::local()),
            _ => None,
        }
    }

    /// Local standalone network (all services on localhost).
    pub fn local() -> Self {
        Self {
            name: "undeployed".into(),
            indexer: "http://127.0.0.1:8088/api/v1/graphql".into(),
            indexer_ws: "ws://127.0.0.1:8088/api/v1/graphql/ws".into(),
            node: "http://127.0.0.1:9944".into(),
            proof_server: "http://127.0.0.1:6300".into(),
        }
    }
}
