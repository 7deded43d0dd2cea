//! The fixed polynomial relation and its R1CS encoding.
//!
//! A relation is `P(x) = y` over the BN254 scalar field, with `x` a private
//! witness and `y` the single public input. Compilation is deterministic:
//! the same relation always yields the same shape and digest.

use ark_bn254::Fr;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use zkgate_core::RelationKind;

use super::error::{ZkError, ZkResult};
use super::inputs::Witness;

const DIGEST_CONTEXT: &str = "zkgate 2024 circuit digest v1";

/// x^3 + x + 5, ascending coefficients
const CUBIC: &[i64] = &[5, 1, 0, 1];

/// (x - 1021)(x - 2053)(x - 3079)(x - 4093), ascending coefficients
const QUARTIC: &[i64] = &[26_415_943_377_211, -53_772_937_114, 36_745_188, -10_246, 1];

/// A fixed polynomial relation `P(x) = y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation(RelationKind);

impl Relation {
    pub const fn cubic() -> Self {
        Self(RelationKind::Cubic)
    }

    pub const fn quartic() -> Self {
        Self(RelationKind::Quartic)
    }

    pub fn kind(&self) -> RelationKind {
        self.0
    }

    /// Ascending coefficients `c0, c1, ...` of `P`.
    pub fn coefficients(&self) -> &'static [i64] {
        match self.0 {
            RelationKind::Cubic => CUBIC,
            RelationKind::Quartic => QUARTIC,
        }
    }

    pub fn degree(&self) -> usize {
        self.coefficients().len() - 1
    }

    /// Evaluate `P(x)` natively.
    pub fn evaluate(&self, x: Fr) -> Fr {
        // Horner, highest coefficient first
        self.coefficients()
            .iter()
            .rev()
            .fold(Fr::from(0u64), |acc, &c| acc * x + coefficient(c))
    }

    pub fn evaluate_u64(&self, x: u64) -> Fr {
        self.evaluate(Fr::from(x))
    }
}

impl From<RelationKind> for Relation {
    fn from(kind: RelationKind) -> Self {
        Self(kind)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn coefficient(c: i64) -> Fr {
    let magnitude = Fr::from(c.unsigned_abs());
    if c < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Circuit instance handed to the proof system.
#[derive(Clone)]
pub struct GateCircuit {
    relation: Relation,
    x: Option<Fr>,
    y: Option<Fr>,
}

impl ConstraintSynthesizer<Fr> for GateCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // Public input first: it is the only instance variable after `one`.
        let y = FpVar::new_input(cs.clone(), || self.y.ok_or(SynthesisError::AssignmentMissing))?;
        let x =
            FpVar::new_witness(cs.clone(), || self.x.ok_or(SynthesisError::AssignmentMissing))?;

        let coefficients = self.relation.coefficients();
        let mut acc = FpVar::Constant(coefficient(coefficients[0]));
        let mut power = x.clone();

        for (degree, &c) in coefficients.iter().enumerate().skip(1) {
            if degree > 1 {
                power = &power * &x;
            }
            if c != 0 {
                acc += &power * coefficient(c);
            }
        }

        acc.enforce_equal(&y)
    }
}

/// Size of the compiled constraint system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitShape {
    pub constraints: usize,
    pub instance_variables: usize,
    pub witness_variables: usize,
}

/// BLAKE3 digest binding keys to one compiled circuit.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircuitDigest(pub(crate) [u8; 32]);

impl CircuitDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CircuitDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CircuitDigest({})", self.to_hex())
    }
}

impl fmt::Display for CircuitDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A relation translated into R1CS, immutable once compiled.
#[derive(Debug, Clone)]
pub struct CompiledCircuit {
    relation: Relation,
    shape: CircuitShape,
    digest: CircuitDigest,
}

/// Translate a relation into its constraint system.
pub fn compile(relation: Relation) -> ZkResult<CompiledCircuit> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    placeholder_circuit(relation)
        .generate_constraints(cs.clone())
        .map_err(|e| ZkError::Setup(format!("synthesis of {} relation: {}", relation, e)))?;

    let shape = CircuitShape {
        constraints: cs.num_constraints(),
        instance_variables: cs.num_instance_variables(),
        witness_variables: cs.num_witness_variables(),
    };

    let mut hasher = blake3::Hasher::new_derive_key(DIGEST_CONTEXT);
    hasher.update(relation.to_string().as_bytes());
    for c in relation.coefficients() {
        hasher.update(&c.to_le_bytes());
    }
    hasher.update(&(shape.constraints as u64).to_le_bytes());
    hasher.update(&(shape.instance_variables as u64).to_le_bytes());
    hasher.update(&(shape.witness_variables as u64).to_le_bytes());
    let digest = CircuitDigest(*hasher.finalize().as_bytes());

    Ok(CompiledCircuit {
        relation,
        shape,
        digest,
    })
}

// Shape does not depend on values; x = 0 gives a satisfying assignment.
fn placeholder_circuit(relation: Relation) -> GateCircuit {
    let x = Fr::from(0u64);
    GateCircuit {
        relation,
        x: Some(x),
        y: Some(relation.evaluate(x)),
    }
}

impl CompiledCircuit {
    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn shape(&self) -> CircuitShape {
        self.shape
    }

    pub fn digest(&self) -> &CircuitDigest {
        &self.digest
    }

    pub(crate) fn setup_circuit(&self) -> GateCircuit {
        placeholder_circuit(self.relation)
    }

    pub(crate) fn circuit_for(&self, witness: &Witness) -> GateCircuit {
        GateCircuit {
            relation: self.relation,
            x: witness.secret(),
            y: Some(witness.public_input()),
        }
    }

    /// Check a full witness against the constraints without proving.
    pub fn is_satisfied(&self, witness: &Witness) -> ZkResult<bool> {
        if !witness.has_secret() {
            return Err(ZkError::MissingSecret);
        }
        let cs = ConstraintSystem::<Fr>::new_ref();
        self.circuit_for(witness)
            .generate_constraints(cs.clone())
            .map_err(|e| ZkError::InvalidInput(e.to_string()))?;
        cs.is_satisfied()
            .map_err(|e| ZkError::InvalidInput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_evaluation() {
        let relation = Relation::cubic();
        assert_eq!(relation.evaluate_u64(3), Fr::from(35u64));
        assert_eq!(relation.evaluate_u64(2), Fr::from(15u64));
        assert_eq!(relation.evaluate_u64(0), Fr::from(5u64));
        assert_eq!(relation.degree(), 3);
    }

    #[test]
    fn test_quartic_roots_evaluate_to_zero() {
        let relation = Relation::quartic();
        for root in [1021u64, 2053, 3079, 4093] {
            assert_eq!(relation.evaluate_u64(root), Fr::from(0u64));
        }
        assert_ne!(relation.evaluate_u64(1022), Fr::from(0u64));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = compile(Relation::cubic()).unwrap();
        let b = compile(Relation::cubic()).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.shape(), b.shape());

        let q = compile(Relation::quartic()).unwrap();
        assert_ne!(a.digest(), q.digest());
    }

    #[test]
    fn test_cubic_shape() {
        let compiled = compile(Relation::cubic()).unwrap();
        let shape = compiled.shape();
        // one + y
        assert_eq!(shape.instance_variables, 2);
        // at least x^2, x^3 and the final equality
        assert!(shape.constraints >= 3);
    }

    #[test]
    fn test_satisfaction_check() {
        let compiled = compile(Relation::cubic()).unwrap();
        assert!(compiled.is_satisfied(&Witness::from_u64(3, 35)).unwrap());
        assert!(!compiled.is_satisfied(&Witness::from_u64(3, 36)).unwrap());
        assert!(matches!(
            compiled.is_satisfied(&Witness::public(Fr::from(35u64))),
            Err(ZkError::MissingSecret)
        ));
    }
}
