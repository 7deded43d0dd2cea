//! Error types for Zero-Knowledge proof operations.

use thiserror::Error;

/// Result type for ZK operations
pub type ZkResult<T> = std::result::Result<T, ZkError>;

/// Error types for Zero-Knowledge proof operations
#[derive(Error, Debug, Clone)]
pub enum ZkError {
    /// Circuit compilation or trusted setup failed
    #[error("Setup failed: {0}")]
    Setup(String),

    /// Witness does not satisfy the relation
    #[error("Constraint unsatisfied: {0}")]
    ConstraintUnsatisfied(String),

    /// Proving key was generated for a different circuit
    #[error("Key/circuit mismatch: key digest {key}, circuit digest {circuit}")]
    KeyMismatch { key: String, circuit: String },

    /// Proving needs the secret part of the witness
    #[error("Witness carries no secret input")]
    MissingSecret,

    /// Proof generation failed
    #[error("Proof generation failed: {0}")]
    ProofGenerationFailed(String),

    /// Key or proof could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key, proof or base64 text could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
