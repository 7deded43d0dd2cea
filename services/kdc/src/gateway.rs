//! Gateway lifecycle: setup, bind, serve both channels, drain on authorization.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::info;

use zkgate_core::{AuthorizationLatch, GatewayConfig};
use zkgate_crypto::Relation;

use crate::error::{GatewayError, GatewayResult};
use crate::proof_server;
use crate::state::AppState;
use crate::ticket_server::{self, TicketIssuer};

/// A gateway with its proof material generated but nothing bound yet.
pub struct Gateway {
    config: GatewayConfig,
    state: Arc<AppState>,
    issuer: Arc<TicketIssuer>,
}

impl Gateway {
    /// Validate configuration, compile the relation and run setup.
    pub fn initialize(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        let issuer = TicketIssuer::from_config(&config)?;
        let state = AppState::new(Relation::from(config.proof.relation))?;

        Ok(Self {
            config,
            state: Arc::new(state),
            issuer: Arc::new(issuer),
        })
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn latch(&self) -> Arc<AuthorizationLatch> {
        Arc::clone(&self.state.latch)
    }

    pub async fn bind(self) -> GatewayResult<BoundGateway> {
        let ticket_listener = bind(self.config.ticket.listen_addr).await?;
        let proof_listener = bind(self.config.proof.listen_addr).await?;

        Ok(BoundGateway {
            ticket_addr: local_addr(&ticket_listener, self.config.ticket.listen_addr),
            proof_addr: local_addr(&proof_listener, self.config.proof.listen_addr),
            ticket_listener,
            proof_listener,
            state: self.state,
            issuer: self.issuer,
            shutdown_timeout: self.config.proof.shutdown_timeout(),
        })
    }
}

async fn bind(addr: SocketAddr) -> GatewayResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })
}

fn local_addr(listener: &TcpListener, fallback: SocketAddr) -> SocketAddr {
    listener.local_addr().unwrap_or(fallback)
}

/// A gateway with both listeners bound; addresses reflect ephemeral ports.
pub struct BoundGateway {
    ticket_addr: SocketAddr,
    proof_addr: SocketAddr,
    ticket_listener: TcpListener,
    proof_listener: TcpListener,
    state: Arc<AppState>,
    issuer: Arc<TicketIssuer>,
    shutdown_timeout: Duration,
}

impl BoundGateway {
    pub fn ticket_addr(&self) -> SocketAddr {
        self.ticket_addr
    }

    pub fn proof_addr(&self) -> SocketAddr {
        self.proof_addr
    }

    pub fn latch(&self) -> Arc<AuthorizationLatch> {
        Arc::clone(&self.state.latch)
    }

    /// Serve until the first valid proof latches authorization and the proof
    /// channel has drained. The ticket channel keeps running; its handle is
    /// returned so the caller decides when to stop it. Dropping this future
    /// early, or failing, stops both channels.
    pub async fn run(self) -> GatewayResult<JoinHandle<()>> {
        let ticket_task = tokio::spawn(ticket_server::serve(self.ticket_listener, self.issuer));
        let ticket_guard = AbortOnDrop::new(&ticket_task);

        let latch = Arc::clone(&self.state.latch);
        let shutdown_signal = Arc::clone(&latch);
        let app = proof_server::router(self.state);
        info!(addr = %self.proof_addr, "Proof channel listening");

        let server = axum::serve(self.proof_listener, app)
            .with_graceful_shutdown(async move { shutdown_signal.wait().await });
        let mut server_task = tokio::spawn(server.into_future());
        let _server_guard = AbortOnDrop::new(&server_task);

        tokio::select! {
            result = &mut server_task => {
                // Exiting before authorization is always a failure.
                flatten(result)?;
                return Err(GatewayError::Serve(std::io::Error::other(
                    "proof channel stopped before authorization",
                )));
            }
            _ = latch.wait() => {
                info!("Authorization latched; draining proof channel");
            }
        }

        match tokio::time::timeout(self.shutdown_timeout, &mut server_task).await {
            Ok(result) => flatten(result)?,
            Err(_) => {
                return Err(GatewayError::ShutdownTimeout {
                    timeout: self.shutdown_timeout,
                });
            }
        }

        info!(addr = %self.ticket_addr, "Proof channel closed; ticket channel still serving");
        ticket_guard.disarm();
        Ok(ticket_task)
    }
}

/// Aborts a spawned task when dropped unless disarmed.
struct AbortOnDrop {
    handle: Option<AbortHandle>,
}

impl AbortOnDrop {
    fn new<T>(task: &JoinHandle<T>) -> Self {
        Self {
            handle: Some(task.abort_handle()),
        }
    }

    fn disarm(mut self) {
        self.handle = None;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn flatten(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> GatewayResult<()> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(GatewayError::Serve(e)),
        Err(e) => Err(GatewayError::Task(e.to_string())),
    }
}
