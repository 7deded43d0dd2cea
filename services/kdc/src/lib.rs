//! zkgate Key Distribution Center.
//!
//! Two channels share one process: a TCP ticket channel that runs an
//! unauthenticated DH exchange and hands out encrypted tickets, and an HTTP
//! proof channel that serves Groth16 keys and latches authorization on the
//! first valid proof.

pub mod error;
pub mod gateway;
pub mod proof_server;
pub mod state;
pub mod ticket_server;

pub use error::{ApiError, GatewayError, GatewayResult};
pub use gateway::{BoundGateway, Gateway};
pub use state::AppState;
pub use ticket_server::{ExchangeState, TicketExchange, TicketIssuer};
