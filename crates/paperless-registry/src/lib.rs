//! Paperless Registry: wallet sessions, the build/balance/prove/submit
//! transaction pipeline, and admin/query operations against the DID
//! registry contract.

pub mod admin;
pub mod contract;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod request;
pub mod service;
pub mod wallet;

pub use contract::{
    BalancedTransaction, CircuitCall, Prover, ProvenTransaction, RegistryContract, RegistryQuery,
    SubmittedTransaction, UnprovenTransaction,
};
pub use error::RegistryError;
pub use memory::{InMemoryLedger, InMemoryProver, InMemoryWalletProvider};
pub use pipeline::{Pipeline, PipelineState, TransactionResult};
pub use request::RegistrationRequest;
pub use service::RegistryClient;
pub use wallet::{SyncProgress, Wallet, WalletProvider, WalletSeed, WalletSession, WalletState};
