use std::net::SocketAddr;
use thiserror::Error;

use zkgate_core::WireError;
use zkgate_crypto::{KeyExchangeError, TicketError, ZkError};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection to {addr} timed out")]
    ConnectTimeout { addr: SocketAddr },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    KeyExchange(#[from] KeyExchangeError),

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Zk(#[from] ZkError),

    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Server circuit {received} does not match local circuit {expected}")]
    CircuitMismatch { expected: String, received: String },

    #[error("Proving task failed: {0}")]
    Task(String),
}
