//! Shared oracle state.

use std::time::Instant;

use paperless_credentials::WitnessBuilder;
use paperless_crypto::{KeyPair, TrustAnchor, TrustAnchorStore};

use crate::config::OracleConfig;

/// Read-only state shared by every request.
pub struct OracleState {
    pub anchors: TrustAnchorStore,
    pub builder: WitnessBuilder,
    pub start_time: Instant,
}

impl OracleState {
    pub fn new(anchors: TrustAnchorStore, builder: WitnessBuilder) -> Self {
        Self {
            anchors,
            builder,
            start_time: Instant::now(),
        }
    }

    /// Load anchors and the issuer key named by `config`.
    pub fn from_config(config: &OracleConfig) -> anyhow::Result<Self> {
        let anchors = if config.trust.anchor_paths.is_empty() {
            TrustAnchorStore::single(TrustAnchor::issuing_authority())
        } else {
            TrustAnchorStore::load_all(config.trust.anchor_paths.as_slice())?
        };
        for anchor in anchors.anchors() {
            tracing::info!(anchor = anchor.name(), "trust anchor loaded");
        }

        let key = match &config.issuer.key_path {
            Some(path) => {
                let key = KeyPair::load(path)?;
                tracing::info!(path = %path.display(), "issuer key loaded");
                key
            }
            None => {
                tracing::warn!("no issuer key configured; using an ephemeral key");
                KeyPair::generate()
            }
        };

        Ok(Self::new(anchors, WitnessBuilder::oracle(key)))
    }
}
