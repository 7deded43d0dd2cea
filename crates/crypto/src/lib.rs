//! Cryptographic primitives for the zkgate authentication gateway.
//!
//! # Core Capabilities
//!
//! - **Key Exchange**: unauthenticated finite-field Diffie-Hellman over a
//!   fixed MODP group, with SHA-256 session key derivation
//! - **Tickets**: AES-256-CFB ticket encryption under a pre-shared key
//! - **Zero-Knowledge Gate**: Groth16 over BN254 for a fixed polynomial
//!   relation (setup, prove, verify)
//!
//! # Security Notes
//!
//! - Exchanged DH public values are not authenticated; an active attacker
//!   can substitute them
//! - Tickets carry no integrity tag; successful decryption only implies
//!   confidentiality, not authenticity
//! - Secrets must never be logged; session keys expose a fingerprint instead

pub mod dh;
pub mod ticket;
pub mod zk;

pub use dh::{
    derive_session_key, derive_shared_secret, generate_key_pair, GroupParameters,
    KeyExchangeError, KeyExchangeResult, KeyPair, SessionKey, SharedSecret,
};

pub use ticket::{decrypt_ticket, encrypt_ticket, Ticket, TicketError, TicketKey, TicketResult};

pub use zk::{
    compile, prove, setup, verify, verify_bytes, CircuitDigest, CompiledCircuit, Fr, GateProof,
    GateProvingKey, GateVerifyingKey, ProofSubmission, ProvingKeyEnvelope, PublicValue, Relation,
    SubmissionReceipt, VerifyingKeyEnvelope, Witness, ZkError, ZkResult,
};
