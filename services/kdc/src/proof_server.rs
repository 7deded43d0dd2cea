//! HTTP proof channel: serves proof material and judges submitted proofs.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use zkgate_crypto::{
    GateProof, ProofSubmission, ProvingKeyEnvelope, SubmissionReceipt, VerifyingKeyEnvelope,
    Witness,
};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/pk", get(proving_key))
        .route("/vk", get(verifying_key))
        .route("/prove", post(submit_proof))
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "authorized": state.is_authorized(),
    }))
}

async fn proving_key(State(state): State<Arc<AppState>>) -> Json<ProvingKeyEnvelope> {
    Json(state.pk_envelope.clone())
}

async fn verifying_key(State(state): State<Arc<AppState>>) -> Json<VerifyingKeyEnvelope> {
    Json(state.vk_envelope.clone())
}

async fn submit_proof(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProofSubmission>, JsonRejection>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let Json(submission) = payload?;

    let y = submission.y.to_field()?;
    let proof = GateProof::from_bytes(&submission.proof_bytes()?)?;

    // Pairing checks are CPU-bound; keep them off the async workers.
    let verifier = Arc::clone(&state);
    let valid = tokio::task::spawn_blocking(move || {
        verifier.verifying_key.verify(&proof, &Witness::public(y))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("verification task: {}", e)))?;

    if !valid {
        warn!(y = %submission.y, "Proof rejected");
        return Err(ApiError::ProofRejected);
    }

    let first_authorization = state.latch.latch();
    if first_authorization {
        info!(y = %submission.y, "First valid proof; service access authorized");
    } else {
        info!(y = %submission.y, "Valid proof after authorization");
    }

    Ok(Json(SubmissionReceipt::accepted(first_authorization)))
}
