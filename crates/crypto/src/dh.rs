//! Finite-field Diffie-Hellman key agreement.
//!
//! Both ends share a fixed MODP group (RFC 3526 group 14 by default). Each
//! connection generates a fresh key pair, exchanges public values and
//! hashes the agreed secret into a 32-byte session key.
//!
//! # Protocol
//!
//! 1. **Generate**: private scalar uniform in `[0, p)` from the OS CSPRNG,
//!    public value `g^priv mod p`
//! 2. **Exchange**: public values travel as minimal big-endian bytes
//! 3. **Agree**: `peer^priv mod p`; the private scalar is consumed here
//! 4. **Derive**: `SHA-256(minimal big-endian bytes of the secret)`
//!
//! # Threat Model
//!
//! The exchange is unauthenticated. Nothing binds a public value to an
//! identity, so an active attacker can run a separate exchange with each
//! side. Only passive eavesdropping is defended against.

use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use zkgate_core::GroupConfig;

/// Session key length in bytes (SHA-256 output).
pub const SESSION_KEY_LEN: usize = 32;

/// Key exchange error types.
#[derive(Debug, thiserror::Error)]
pub enum KeyExchangeError {
    #[error("Invalid group parameters: {0}")]
    InvalidParameters(String),

    #[error("Malformed public value: {0}")]
    MalformedPublicValue(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type for key exchange operations.
pub type KeyExchangeResult<T> = Result<T, KeyExchangeError>;

/// DH domain parameters. Immutable once built and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParameters {
    modulus: BigUint,
    generator: BigUint,
    modulus_len: usize,
}

impl GroupParameters {
    pub fn new(modulus: BigUint, generator: BigUint) -> KeyExchangeResult<Self> {
        let three = BigUint::from(3u8);
        if modulus <= three || !modulus.bit(0) {
            return Err(KeyExchangeError::InvalidParameters(
                "modulus must be an odd prime greater than 3".to_string(),
            ));
        }

        let upper = &modulus - 1u8;
        if generator < BigUint::from(2u8) || generator >= upper {
            return Err(KeyExchangeError::InvalidParameters(
                "generator must lie in [2, p-2]".to_string(),
            ));
        }

        let modulus_len = ((modulus.bits() + 7) / 8) as usize;
        Ok(Self {
            modulus,
            generator,
            modulus_len,
        })
    }

    pub fn from_config(config: &GroupConfig) -> KeyExchangeResult<Self> {
        let modulus = BigUint::parse_bytes(config.modulus_hex.as_bytes(), 16).ok_or_else(|| {
            KeyExchangeError::InvalidParameters("modulus is not valid hex".to_string())
        })?;
        Self::new(modulus, BigUint::from(config.generator))
    }

    /// RFC 3526 2048-bit MODP group with generator 2.
    pub fn rfc3526_2048() -> KeyExchangeResult<Self> {
        Self::from_config(&GroupConfig::default())
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// Modulus size in bytes; upper bound for an encoded public value.
    pub fn modulus_len(&self) -> usize {
        self.modulus_len
    }

    /// Minimal big-endian encoding of a public value.
    pub fn encode_public(&self, value: &BigUint) -> Vec<u8> {
        value.to_bytes_be()
    }

    /// Decode and range-check a peer public value.
    ///
    /// Values outside `(1, p-1)` confine the shared secret to a trivial
    /// subgroup and are refused.
    pub fn decode_public(&self, bytes: &[u8]) -> KeyExchangeResult<BigUint> {
        if bytes.is_empty() {
            return Err(KeyExchangeError::MalformedPublicValue(
                "empty encoding".to_string(),
            ));
        }
        if bytes.len() > self.modulus_len {
            return Err(KeyExchangeError::MalformedPublicValue(format!(
                "{} bytes exceeds modulus size {}",
                bytes.len(),
                self.modulus_len
            )));
        }

        let value = BigUint::from_bytes_be(bytes);
        let upper = &self.modulus - 1u8;
        if value <= BigUint::from(1u8) || value >= upper {
            return Err(KeyExchangeError::MalformedPublicValue(
                "value outside (1, p-1)".to_string(),
            ));
        }
        Ok(value)
    }
}

/// Ephemeral DH key pair. The private scalar is consumed by agreement.
pub struct KeyPair {
    pub public: BigUint,
    private: Option<BigUint>,
}

impl KeyPair {
    /// Compute the shared secret with a peer's (already decoded) public value.
    pub fn compute_shared_secret(
        &mut self,
        params: &GroupParameters,
        peer_public: &BigUint,
    ) -> KeyExchangeResult<SharedSecret> {
        let private = self.private.take().ok_or_else(|| {
            KeyExchangeError::InvalidState("Private scalar already consumed".to_string())
        })?;
        Ok(derive_shared_secret(&private, peer_public, params.modulus()))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_bits", &self.public.bits())
            .field("private", &self.private.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Raw DH agreement result. Hash it with [`derive_session_key`] and drop it.
pub struct SharedSecret(BigUint);

impl SharedSecret {
    /// Minimal big-endian bytes, the canonical input to key derivation.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// 32-byte symmetric session key, zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    pub fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }

    /// Short non-reversible tag suitable for logs.
    pub fn fingerprint(&self) -> String {
        let digest = blake3::hash(&self.0);
        hex::encode(&digest.as_bytes()[..4])
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({})", self.fingerprint())
    }
}

impl Serialize for SessionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for SessionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let mut bytes = [0u8; SESSION_KEY_LEN];
        hex::decode_to_slice(&encoded, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

/// Generate a fresh key pair: private scalar uniform in `[0, p)`.
///
/// Draws whose public value the peer would refuse (1 or p-1) are redrawn.
pub fn generate_key_pair(params: &GroupParameters) -> KeyPair {
    let mut rng = OsRng;
    let upper = params.modulus() - 1u8;
    loop {
        let private = rng.gen_biguint_below(params.modulus());
        let public = params.generator().modpow(&private, params.modulus());
        if public > BigUint::from(1u8) && public < upper {
            return KeyPair {
                public,
                private: Some(private),
            };
        }
    }
}

/// `their_public ^ my_private mod p`
pub fn derive_shared_secret(
    my_private: &BigUint,
    their_public: &BigUint,
    modulus: &BigUint,
) -> SharedSecret {
    SharedSecret(their_public.modpow(my_private, modulus))
}

/// SHA-256 over the shared secret's minimal big-endian bytes.
pub fn derive_session_key(secret: &SharedSecret) -> SessionKey {
    let mut bytes = secret.to_bytes_be();
    let digest = Sha256::digest(&bytes);
    bytes.zeroize();
    SessionKey(digest.into())
}
