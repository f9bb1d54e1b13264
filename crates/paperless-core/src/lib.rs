//! Paperless Core: fundamental types, errors, and the transaction stage
//! machine shared by the credential and registry layers.

pub mod config;
pub mod error;
pub mod tx_stage;
pub mod types;

pub use config::NetworkConfig;
pub use error::{CoreError, ErrorKind};
pub use tx_stage::{TxStage, TxStageMachine};
pub use types::{Bytes32, Did, WalletRole};
