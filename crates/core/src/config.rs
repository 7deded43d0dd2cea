//! Configuration management for zkgate.
//!
//! Group parameters and the ticket key are passed explicitly at
//! initialization; nothing here is a process global.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

/// RFC 3526 2048-bit MODP group (group 14) prime, big-endian hex.
pub const RFC3526_MODP_2048_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA237327FFFFFFFFFFFFFFFF",
);

/// Development ticket key. Deployments must override `ticket.key_hex`.
pub const DEV_TICKET_KEY_HEX: &str =
    "fe86ed5edd0cfbefc32f904747c30bb20de64010b6c62a97a70e2e021abdbee0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub group: GroupConfig,
    #[serde(default)]
    pub ticket: TicketConfig,
    #[serde(default)]
    pub proof: ProofConfig,
}

/// Diffie-Hellman domain parameters. Both ends must agree exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub modulus_hex: String,
    pub generator: u64,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketConfig {
    pub listen_addr: SocketAddr,
    pub service_name: String,
    /// Pre-shared AES-256 key (64 hex characters)
    pub key_hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    pub listen_addr: SocketAddr,
    pub relation: RelationKind,
    pub shutdown_timeout_secs: u64,
}

/// Which fixed polynomial relation the proof gate enforces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// x^3 + x + 5 = y
    #[default]
    Cubic,
    /// x^4 - 10246x^3 + 36745188x^2 - 53772937114x + 26415943377211 = y
    Quartic,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Cubic => write!(f, "cubic"),
            RelationKind::Quartic => write!(f, "quartic"),
        }
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            modulus_hex: RFC3526_MODP_2048_HEX.to_string(),
            generator: 2,
        }
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            service_name: "zkgate-service".to_string(),
            key_hex: DEV_TICKET_KEY_HEX.to_string(),
        }
    }
}

// The key never reaches logs.
impl fmt::Debug for TicketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketConfig")
            .field("listen_addr", &self.listen_addr)
            .field("service_name", &self.service_name)
            .field("key_hex", &"<redacted>")
            .finish()
    }
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8081)),
            relation: RelationKind::default(),
            shutdown_timeout_secs: 5,
        }
    }
}

impl ProofConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl GatewayConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            group: GroupConfig::default(),
            ticket: TicketConfig::default(),
            proof: ProofConfig::default(),
        }
    }

    /// Structural checks only; the crypto layer re-validates what it parses.
    pub fn validate(&self) -> CoreResult<()> {
        if self.group.modulus_hex.is_empty()
            || !self.group.modulus_hex.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(CoreError::Config(
                "group.modulus_hex must be a non-empty hex string".to_string(),
            ));
        }

        if self.group.generator < 2 {
            return Err(CoreError::Config(format!(
                "group.generator must be at least 2, got {}",
                self.group.generator
            )));
        }

        let key = hex::decode(&self.ticket.key_hex)
            .map_err(|e| CoreError::Config(format!("ticket.key_hex is not hex: {}", e)))?;
        if key.len() != 32 {
            return Err(CoreError::Config(format!(
                "ticket.key_hex must encode 32 bytes, got {}",
                key.len()
            )));
        }

        if self.ticket.service_name.trim().is_empty() {
            return Err(CoreError::Config(
                "ticket.service_name must not be empty".to_string(),
            ));
        }

        if self.proof.shutdown_timeout_secs == 0 {
            return Err(CoreError::Config(
                "proof.shutdown_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
