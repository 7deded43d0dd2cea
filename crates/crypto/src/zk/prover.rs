//! Groth16 setup, proving and verification over BN254.
//!
//! Keys carry the digest of the circuit they were generated for, so a key
//! can never be silently paired with another relation. Serialized keys are
//! `digest (32 bytes) || compressed arkworks encoding`.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use rand::rngs::OsRng;
use std::fmt;

use super::circuit::{CircuitDigest, CompiledCircuit};
use super::error::{ZkError, ZkResult};
use super::inputs::Witness;

const DIGEST_LEN: usize = 32;

/// Proving key bound to one compiled circuit.
#[derive(Clone)]
pub struct GateProvingKey {
    digest: CircuitDigest,
    inner: ProvingKey<Bn254>,
}

/// Verifying key bound to one compiled circuit, kept in prepared form.
#[derive(Clone)]
pub struct GateVerifyingKey {
    digest: CircuitDigest,
    inner: VerifyingKey<Bn254>,
    prepared: PreparedVerifyingKey<Bn254>,
}

/// An opaque Groth16 proof.
#[derive(Clone, PartialEq)]
pub struct GateProof(Proof<Bn254>);

impl fmt::Debug for GateProvingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateProvingKey")
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for GateVerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateVerifyingKey")
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for GateProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GateProof(..)")
    }
}

impl GateProvingKey {
    pub fn digest(&self) -> &CircuitDigest {
        &self.digest
    }

    pub fn to_bytes(&self) -> ZkResult<Vec<u8>> {
        with_digest(&self.digest, &self.inner)
    }

    pub fn from_bytes(bytes: &[u8]) -> ZkResult<Self> {
        let (digest, body) = split_digest(bytes)?;
        let inner = ProvingKey::<Bn254>::deserialize_compressed(body)
            .map_err(|e| ZkError::Encoding(format!("proving key: {}", e)))?;
        Ok(Self { digest, inner })
    }
}

impl GateVerifyingKey {
    fn new(digest: CircuitDigest, inner: VerifyingKey<Bn254>) -> ZkResult<Self> {
        let prepared = Groth16::<Bn254>::process_vk(&inner)
            .map_err(|e| ZkError::Setup(format!("verifying key preparation: {}", e)))?;
        Ok(Self {
            digest,
            inner,
            prepared,
        })
    }

    pub fn digest(&self) -> &CircuitDigest {
        &self.digest
    }

    pub fn to_bytes(&self) -> ZkResult<Vec<u8>> {
        with_digest(&self.digest, &self.inner)
    }

    pub fn from_bytes(bytes: &[u8]) -> ZkResult<Self> {
        let (digest, body) = split_digest(bytes)?;
        let inner = VerifyingKey::<Bn254>::deserialize_compressed(body)
            .map_err(|e| ZkError::Encoding(format!("verifying key: {}", e)))?;
        Self::new(digest, inner)
    }

    /// Check `proof` against the public input. Never errors: anything that
    /// does not verify is `false`.
    pub fn verify(&self, proof: &GateProof, public: &Witness) -> bool {
        verify(proof, self, public)
    }
}

impl GateProof {
    pub fn to_bytes(&self) -> ZkResult<Vec<u8>> {
        let mut out = Vec::new();
        self.0
            .serialize_compressed(&mut out)
            .map_err(|e| ZkError::Serialization(e.to_string()))?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> ZkResult<Self> {
        Proof::<Bn254>::deserialize_compressed(bytes)
            .map(Self)
            .map_err(|e| ZkError::Encoding(format!("proof: {}", e)))
    }
}

fn with_digest<T: CanonicalSerialize>(digest: &CircuitDigest, key: &T) -> ZkResult<Vec<u8>> {
    let mut out = Vec::with_capacity(DIGEST_LEN + key.compressed_size());
    out.extend_from_slice(digest.as_bytes());
    key.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(e.to_string()))?;
    Ok(out)
}

fn split_digest(bytes: &[u8]) -> ZkResult<(CircuitDigest, &[u8])> {
    if bytes.len() <= DIGEST_LEN {
        return Err(ZkError::Encoding(format!(
            "key too short: {} bytes",
            bytes.len()
        )));
    }
    let (head, body) = bytes.split_at(DIGEST_LEN);
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(head);
    Ok((CircuitDigest(digest), body))
}

/// Circuit-specific trusted setup. Toxic waste is dropped with the RNG state.
pub fn setup(compiled: &CompiledCircuit) -> ZkResult<(GateProvingKey, GateVerifyingKey)> {
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(compiled.setup_circuit(), &mut OsRng)
        .map_err(|e| ZkError::Setup(format!("{} relation: {}", compiled.relation(), e)))?;

    let digest = *compiled.digest();
    tracing::debug!(
        relation = %compiled.relation(),
        constraints = compiled.shape().constraints,
        digest = %digest,
        "Groth16 setup complete"
    );
    let verifying_key = GateVerifyingKey::new(digest, vk)?;
    Ok((GateProvingKey { digest, inner: pk }, verifying_key))
}

/// Produce a proof that the witness satisfies the compiled relation.
pub fn prove(
    compiled: &CompiledCircuit,
    pk: &GateProvingKey,
    witness: &Witness,
) -> ZkResult<GateProof> {
    if pk.digest != *compiled.digest() {
        return Err(ZkError::KeyMismatch {
            key: pk.digest.to_hex(),
            circuit: compiled.digest().to_hex(),
        });
    }
    if !witness.has_secret() {
        return Err(ZkError::MissingSecret);
    }
    if !compiled.is_satisfied(witness)? {
        return Err(ZkError::ConstraintUnsatisfied(format!(
            "witness does not satisfy the {} relation",
            compiled.relation()
        )));
    }

    Groth16::<Bn254>::prove(&pk.inner, compiled.circuit_for(witness), &mut OsRng)
        .map(GateProof)
        .map_err(|e| ZkError::ProofGenerationFailed(e.to_string()))
}

/// Verify a proof against the public part of a witness.
pub fn verify(proof: &GateProof, vk: &GateVerifyingKey, public: &Witness) -> bool {
    let inputs: [Fr; 1] = [public.public_input()];
    Groth16::<Bn254>::verify_with_processed_vk(&vk.prepared, &inputs, &proof.0).unwrap_or(false)
}

/// Verify serialized proof bytes; undecodable bytes verify as `false`.
pub fn verify_bytes(proof: &[u8], vk: &GateVerifyingKey, public: &Witness) -> bool {
    match GateProof::from_bytes(proof) {
        Ok(proof) => verify(&proof, vk, public),
        Err(_) => false,
    }
}
