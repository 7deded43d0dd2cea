//! Test utilities for gateway integration tests

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use zkgate_core::{AuthorizationLatch, GatewayConfig, RelationKind};
use zkgate_kdc::{Gateway, GatewayResult};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Default configuration with both channels on ephemeral localhost ports.
pub fn ephemeral_config(relation: RelationKind) -> GatewayConfig {
    let mut config = GatewayConfig::default_config();
    config.ticket.listen_addr = SocketAddr::from(([127, 0, 0, 1], 0));
    config.proof.listen_addr = SocketAddr::from(([127, 0, 0, 1], 0));
    config.proof.relation = relation;
    config
}

/// A gateway serving in the background.
pub struct RunningGateway {
    pub config: GatewayConfig,
    pub ticket_addr: SocketAddr,
    pub proof_addr: SocketAddr,
    pub latch: Arc<AuthorizationLatch>,
    pub run: JoinHandle<GatewayResult<JoinHandle<()>>>,
}

impl RunningGateway {
    pub fn proof_url(&self) -> String {
        format!("http://{}", self.proof_addr)
    }

    /// Wait for the proof channel to finish draining and stop the ticket
    /// channel it hands back.
    pub async fn finish(self) -> GatewayResult<()> {
        let ticket_task = tokio::time::timeout(Duration::from_secs(10), self.run)
            .await
            .expect("gateway did not finish")
            .expect("gateway task panicked")?;
        ticket_task.abort();
        Ok(())
    }

    /// Stop a gateway that has not been authorized. Cancelling `run` stops
    /// both channels and releases their ports.
    pub async fn shutdown(self) {
        self.run.abort();
        let _ = self.run.await;
    }
}

/// Start a gateway for the given relation and give it time to begin accepting.
pub async fn start_gateway(relation: RelationKind) -> RunningGateway {
    init_tracing();
    let config = ephemeral_config(relation);

    let bound = Gateway::initialize(config.clone())
        .unwrap()
        .bind()
        .await
        .unwrap();
    let ticket_addr = bound.ticket_addr();
    let proof_addr = bound.proof_addr();
    let latch = bound.latch();

    let run = tokio::spawn(bound.run());

    // Give the servers time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningGateway {
        config,
        ticket_addr,
        proof_addr,
        latch,
        run,
    }
}
