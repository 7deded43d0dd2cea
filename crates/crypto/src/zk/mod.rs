//! Zero-knowledge gate: a fixed polynomial relation proven with Groth16.
//!
//! The flow is `compile` once, `setup` once, then any number of `prove` and
//! `verify` calls against the resulting keys.

pub mod circuit;
pub mod envelope;
pub mod error;
pub mod inputs;
pub mod prover;

/// Scalar field of BN254, the domain of `x` and `y`.
pub use ark_bn254::Fr;
pub use circuit::{compile, CircuitDigest, CircuitShape, CompiledCircuit, Relation};
pub use envelope::{ProofSubmission, ProvingKeyEnvelope, SubmissionReceipt, VerifyingKeyEnvelope};
pub use error::{ZkError, ZkResult};
pub use inputs::{PublicValue, Witness};
pub use prover::{prove, setup, verify, verify_bytes, GateProof, GateProvingKey, GateVerifyingKey};
