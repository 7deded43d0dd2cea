//! Witness and public-input types for the gate relation.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{ZkError, ZkResult};

/// Assignment to the relation's variables.
///
/// A full witness carries the secret `x`; its public projection carries only
/// `y` and is what a verifier works with.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Witness {
    secret: Option<Fr>,
    public: Fr,
}

impl Witness {
    /// Full witness `{x, y}`.
    pub fn new(x: Fr, y: Fr) -> Self {
        Self {
            secret: Some(x),
            public: y,
        }
    }

    /// Public-only witness `{y}`.
    pub fn public(y: Fr) -> Self {
        Self {
            secret: None,
            public: y,
        }
    }

    pub fn from_u64(x: u64, y: u64) -> Self {
        Self::new(Fr::from(x), Fr::from(y))
    }

    /// Drop the secret, keeping only the public input.
    pub fn public_projection(&self) -> Self {
        Self::public(self.public)
    }

    pub fn public_input(&self) -> Fr {
        self.public
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub(crate) fn secret(&self) -> Option<Fr> {
        self.secret
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("secret", &self.secret.map(|_| "<redacted>"))
            .field("public", &PublicValue::from_field(self.public))
            .finish()
    }
}

/// Public input `y` as it travels in JSON.
///
/// Small values are plain integers; anything up to the field modulus may be
/// sent as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublicValue {
    Integer(u64),
    Decimal(String),
}

impl PublicValue {
    /// Parse into a field element, rejecting values at or above the modulus.
    pub fn to_field(&self) -> ZkResult<Fr> {
        match self {
            PublicValue::Integer(v) => Ok(Fr::from(*v)),
            PublicValue::Decimal(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ZkError::InvalidInput(format!(
                        "public input is not a decimal integer: {:?}",
                        s
                    )));
                }
                let value = BigUint::parse_bytes(trimmed.as_bytes(), 10).ok_or_else(|| {
                    ZkError::InvalidInput(format!("public input is not a decimal integer: {:?}", s))
                })?;
                if value >= field_modulus() {
                    return Err(ZkError::InvalidInput(
                        "public input exceeds the field modulus".to_string(),
                    ));
                }
                Ok(Fr::from_be_bytes_mod_order(&value.to_bytes_be()))
            }
        }
    }

    /// Canonical representation of a field element.
    pub fn from_field(value: Fr) -> Self {
        let big = BigUint::from_bytes_le(&value.into_bigint().to_bytes_le());
        match u64::try_from(&big) {
            Ok(small) => PublicValue::Integer(small),
            Err(_) => PublicValue::Decimal(big.to_string()),
        }
    }
}

impl From<u64> for PublicValue {
    fn from(value: u64) -> Self {
        PublicValue::Integer(value)
    }
}

impl fmt::Display for PublicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicValue::Integer(v) => write!(f, "{}", v),
            PublicValue::Decimal(s) => f.write_str(s),
        }
    }
}

fn field_modulus() -> BigUint {
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}
