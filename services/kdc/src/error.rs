//! Gateway errors and their HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use zkgate_core::{CoreError, WireError};
use zkgate_crypto::{KeyExchangeError, TicketError, ZkError};

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    KeyExchange(#[from] KeyExchangeError),

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Zk(#[from] ZkError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Proof channel failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Ticket exchange timed out")]
    ExchangeTimeout,

    #[error("Proof channel did not drain within {timeout:?}")]
    ShutdownTimeout { timeout: Duration },

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Error returned by proof channel handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Undecodable JSON, base64, proof bytes or public input.
    BadRequest(String),
    /// Well-formed proof that does not verify.
    ProofRejected,
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::ProofRejected => (StatusCode::FORBIDDEN, "PROOF_REJECTED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ProofRejected => "proof did not verify for the given public input".into(),
            // Internal detail stays in the logs.
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "internal server error".into()
            }
        };
        (status, Json(ErrorBody { error: ErrorDetail { code, message } })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ZkError> for ApiError {
    fn from(err: ZkError) -> Self {
        match err {
            ZkError::Encoding(_) | ZkError::InvalidInput(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
