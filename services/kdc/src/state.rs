use std::sync::Arc;
use tracing::info;

use zkgate_core::AuthorizationLatch;
use zkgate_crypto::{
    compile, setup, CompiledCircuit, GateVerifyingKey, ProvingKeyEnvelope, Relation,
    VerifyingKeyEnvelope,
};

use crate::error::GatewayResult;

/// Proof channel state, built once at startup and shared by all handlers.
pub struct AppState {
    pub compiled: CompiledCircuit,
    pub verifying_key: GateVerifyingKey,
    pub pk_envelope: ProvingKeyEnvelope,
    pub vk_envelope: VerifyingKeyEnvelope,
    pub latch: Arc<AuthorizationLatch>,
}

impl AppState {
    /// Compile the relation and run trusted setup. Any failure here is fatal.
    pub fn new(relation: Relation) -> GatewayResult<Self> {
        let compiled = compile(relation)?;
        let (pk, vk) = setup(&compiled)?;

        let pk_envelope = ProvingKeyEnvelope::new(&pk)?;
        let vk_envelope = VerifyingKeyEnvelope::new(&vk, &compiled)?;

        info!(
            relation = %relation,
            constraints = compiled.shape().constraints,
            digest = %compiled.digest(),
            "Proof material ready"
        );

        Ok(Self {
            compiled,
            verifying_key: vk,
            pk_envelope,
            vk_envelope,
            latch: Arc::new(AuthorizationLatch::new()),
        })
    }

    pub fn is_authorized(&self) -> bool {
        self.latch.is_set()
    }
}
