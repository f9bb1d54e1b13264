//! HTTP API of the verification oracle.
//!
//! `POST /verify-aadhaar` takes a multipart form with the offline KYC
//! archive (`file`) and its share code (`password`), verifies the signed
//! document against the pinned anchors and answers with a registration
//! witness.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use paperless_credentials::{verify_with_store, KycBundle, Witness};

use crate::error::AppError;
use crate::state::OracleState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct IssuerResponse {
    /// Hex Ed25519 key witnesses are signed with.
    pub public_key: Option<String>,
    pub anchors: Vec<String>,
    pub uptime_secs: u64,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_issuer(State(state): State<Arc<OracleState>>) -> Json<IssuerResponse> {
    Json(IssuerResponse {
        public_key: state.builder.issuer_public_key().map(|k| k.to_hex()),
        anchors: state
            .anchors
            .anchors()
            .iter()
            .map(|a| a.name().to_string())
            .collect(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn handle_verify(
    State(state): State<Arc<OracleState>>,
    mut multipart: Multipart,
) -> Result<Json<Witness>, AppError> {
    let mut archive: Option<Vec<u8>> = None;
    let mut password: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("cannot read file field: {e}")))?;
                archive = Some(bytes.to_vec());
            }
            Some("password") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("cannot read password field: {e}")))?;
                password = Some(text);
            }
            _ => {}
        }
    }

    let archive = archive
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::BadRequest("No file uploaded".into()))?;
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("No password provided".into()))?;

    tracing::info!(bytes = archive.len(), "verification requested");

    // Decryption and RSA verification are CPU-bound.
    let witness = tokio::task::spawn_blocking(move || process(&state, archive, &password))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))??;
    Ok(Json(witness))
}

fn process(state: &OracleState, archive: Vec<u8>, password: &str) -> Result<Witness, AppError> {
    let doc = KycBundle::new(archive).extract(password)?;
    let outcome = verify_with_store(&doc, &state.anchors);
    if !outcome.overall_valid() {
        return Err(AppError::Unverified(Box::new(outcome)));
    }
    Ok(state.builder.build(&doc, &outcome)?)
}

pub fn build_router(state: Arc<OracleState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/verify-aadhaar", post(handle_verify))
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/issuer", get(handle_issuer))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<OracleState>,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    let app = build_router(state, max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "oracle listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received shutdown signal"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}
