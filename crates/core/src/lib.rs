//! Core functionality for the zkgate authentication gateway.
//!
//! This crate provides the configuration model, logging bootstrap, the
//! one-shot authorization latch and the stream framing shared by the KDC
//! service and its clients.

pub mod config;
pub mod error;
pub mod latch;
pub mod logging;
pub mod wire;

pub use config::{GatewayConfig, GroupConfig, ProofConfig, RelationKind, TicketConfig};
pub use error::{CoreError, CoreResult};
pub use latch::AuthorizationLatch;
pub use wire::{read_frame, write_frame, WireError, WireResult, MAX_FRAME_LEN};
