//! Typed client for the zkgate KDC.
//!
//! [`TicketClient`] speaks the framed DH/ticket protocol over TCP;
//! [`ProofClient`] fetches proof material and submits proofs over HTTP.

pub mod error;
pub mod proof;
pub mod ticket;

pub use error::{ClientError, ClientResult};
pub use proof::{ProofClient, SubmissionOutcome};
pub use ticket::{TicketClient, CONNECT_TIMEOUT};
