//! Ticket encryption under the KDC's pre-shared key.
//!
//! Wire format: `IV (16 bytes) || AES-256-CFB(serialized ticket)`.
//!
//! The cipher gives confidentiality only. There is no authentication tag,
//! so a ticket that decrypts and parses is not thereby proven authentic.

use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::dh::SessionKey;

/// AES block size, which is also the IV length.
pub const BLOCK_SIZE: usize = 16;

/// Ticket key length (AES-256).
pub const TICKET_KEY_LEN: usize = 32;

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Ciphertext too short: {len} bytes, need at least {}", BLOCK_SIZE)]
    CiphertextTooShort { len: usize },

    #[error("Ticket deserialization failed: {0}")]
    Deserialization(String),

    #[error("Ticket serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid ticket key: {0}")]
    InvalidKey(String),
}

pub type TicketResult<T> = Result<T, TicketError>;

/// Authorization assertion issued by the KDC.
///
/// Carries only the session key and target service. Principal identity,
/// issue time and lifetime are not part of the ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub session_key: SessionKey,
    pub service_name: String,
}

impl Ticket {
    pub fn new(session_key: SessionKey, service_name: impl Into<String>) -> Self {
        Self {
            session_key,
            service_name: service_name.into(),
        }
    }
}

/// Symmetric key shared out-of-band between KDC and clients.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TicketKey([u8; TICKET_KEY_LEN]);

impl TicketKey {
    pub fn from_bytes(bytes: [u8; TICKET_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(encoded: &str) -> TicketResult<Self> {
        let mut bytes = [0u8; TICKET_KEY_LEN];
        hex::decode_to_slice(encoded.trim(), &mut bytes)
            .map_err(|e| TicketError::InvalidKey(e.to_string()))?;
        Ok(Self(bytes))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TicketKey(<redacted>)")
    }
}

/// Serialize, encrypt under a fresh random IV and return `IV || ciphertext`.
pub fn encrypt_ticket(ticket: &Ticket, key: &TicketKey) -> TicketResult<Vec<u8>> {
    let mut plaintext =
        serde_json::to_vec(ticket).map_err(|e| TicketError::Serialization(e.to_string()))?;

    let mut iv = [0u8; BLOCK_SIZE];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256CfbEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| TicketError::InvalidKey(e.to_string()))?;

    let mut out = Vec::with_capacity(BLOCK_SIZE + plaintext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&plaintext);
    cipher.encrypt(&mut out[BLOCK_SIZE..]);

    plaintext.zeroize();
    Ok(out)
}

/// Split off the IV, decrypt and parse.
pub fn decrypt_ticket(bytes: &[u8], key: &TicketKey) -> TicketResult<Ticket> {
    if bytes.len() < BLOCK_SIZE {
        return Err(TicketError::CiphertextTooShort { len: bytes.len() });
    }

    let (iv, ciphertext) = bytes.split_at(BLOCK_SIZE);
    let cipher = Aes256CfbDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| TicketError::InvalidKey(e.to_string()))?;

    let mut plaintext = ciphertext.to_vec();
    cipher.decrypt(&mut plaintext);

    let ticket = serde_json::from_slice(&plaintext)
        .map_err(|e| TicketError::Deserialization(e.to_string()));
    plaintext.zeroize();
    ticket
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ticket() -> Ticket {
        Ticket::new(SessionKey::from_bytes([7u8; 32]), "file-service")
    }

    fn test_key() -> TicketKey {
        TicketKey::from_hex("fe86ed5edd0cfbefc32f904747c30bb20de64010b6c62a97a70e2e021abdbee0")
            .unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let ticket = test_ticket();
        let key = test_key();

        let blob = encrypt_ticket(&ticket, &key).unwrap();
        let decrypted = decrypt_ticket(&blob, &key).unwrap();
        assert_eq!(decrypted, ticket);
    }

    #[test]
    fn test_ciphertext_layout() {
        let ticket = test_ticket();
        let key = test_key();
        let plaintext_len = serde_json::to_vec(&ticket).unwrap().len();

        let blob = encrypt_ticket(&ticket, &key).unwrap();
        assert_eq!(blob.len(), BLOCK_SIZE + plaintext_len);
        assert!(!blob.windows(12).any(|w| w == b"file-service"));
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let ticket = test_ticket();
        let key = test_key();

        let a = encrypt_ticket(&ticket, &key).unwrap();
        let b = encrypt_ticket(&ticket, &key).unwrap();
        assert_ne!(a[..BLOCK_SIZE], b[..BLOCK_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        let key = test_key();
        let result = decrypt_ticket(&[0u8; BLOCK_SIZE - 1], &key);
        assert!(matches!(
            result,
            Err(TicketError::CiphertextTooShort { len: 15 })
        ));
    }

    #[test]
    fn test_wrong_key_fails_to_parse() {
        let ticket = test_ticket();
        let blob = encrypt_ticket(&ticket, &test_key()).unwrap();

        let other = TicketKey::from_bytes([0x42; 32]);
        let result = decrypt_ticket(&blob, &other);
        assert!(matches!(result, Err(TicketError::Deserialization(_))));
    }

    #[test]
    fn test_iv_only_blob_is_not_a_ticket() {
        let key = test_key();
        let result = decrypt_ticket(&[0u8; BLOCK_SIZE], &key);
        assert!(matches!(result, Err(TicketError::Deserialization(_))));
    }

    #[test]
    fn test_bad_key_hex_rejected() {
        assert!(matches!(
            TicketKey::from_hex("zz"),
            Err(TicketError::InvalidKey(_))
        ));
        assert!(TicketKey::from_hex(&"ab".repeat(16)).is_err());
    }
}
