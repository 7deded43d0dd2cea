//! JSON envelopes for the proof channel.
//!
//! Binary material (keys, proofs) is carried as standard base64.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use zkgate_core::RelationKind;

use super::circuit::CompiledCircuit;
use super::error::{ZkError, ZkResult};
use super::inputs::PublicValue;
use super::prover::{GateProof, GateProvingKey, GateVerifyingKey};

pub fn encode_b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_b64(text: &str) -> ZkResult<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| ZkError::Encoding(format!("base64: {}", e)))
}

/// Body of `GET /pk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvingKeyEnvelope {
    pub pk: String,
}

impl ProvingKeyEnvelope {
    pub fn new(pk: &GateProvingKey) -> ZkResult<Self> {
        Ok(Self {
            pk: encode_b64(&pk.to_bytes()?),
        })
    }

    pub fn proving_key(&self) -> ZkResult<GateProvingKey> {
        GateProvingKey::from_bytes(&decode_b64(&self.pk)?)
    }
}

/// Body of `GET /vk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyingKeyEnvelope {
    pub vk: String,
    pub relation: RelationKind,
    pub circuit_digest: String,
    pub constraints: usize,
}

impl VerifyingKeyEnvelope {
    pub fn new(vk: &GateVerifyingKey, compiled: &CompiledCircuit) -> ZkResult<Self> {
        Ok(Self {
            vk: encode_b64(&vk.to_bytes()?),
            relation: compiled.relation().kind(),
            circuit_digest: compiled.digest().to_hex(),
            constraints: compiled.shape().constraints,
        })
    }

    pub fn verifying_key(&self) -> ZkResult<GateVerifyingKey> {
        GateVerifyingKey::from_bytes(&decode_b64(&self.vk)?)
    }
}

/// Body of `POST /prove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofSubmission {
    pub proof: String,
    pub y: PublicValue,
}

impl ProofSubmission {
    pub fn new(proof: &GateProof, y: PublicValue) -> ZkResult<Self> {
        Ok(Self {
            proof: encode_b64(&proof.to_bytes()?),
            y,
        })
    }

    pub fn proof_bytes(&self) -> ZkResult<Vec<u8>> {
        decode_b64(&self.proof)
    }
}

/// Body of a successful `POST /prove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub status: String,
    /// True only for the request that flipped the authorization latch.
    pub first_authorization: bool,
}

impl SubmissionReceipt {
    pub fn accepted(first_authorization: bool) -> Self {
        Self {
            status: "accepted".to_string(),
            first_authorization,
        }
    }
}
