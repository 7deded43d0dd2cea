//! Cross-crate scenarios for the zkgate KDC
//!
//! This test suite validates:
//! - DH ticket exchange over real TCP against a running gateway
//! - The proof gate end to end: key fetch, local proving, submission
//! - Authorization latching and proof channel shutdown
//! - Ticket channel availability after the proof channel closes

pub mod test_utils;

#[cfg(test)]
mod ticket_exchange_tests;

#[cfg(test)]
mod proof_gate_tests;
