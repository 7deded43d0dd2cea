//! TCP ticket channel.
//!
//! Each connection runs one DH exchange and receives one encrypted ticket:
//!
//! ```text
//! client                         kdc
//!   | -- frame(client public) --> |   AwaitingPeer -> KeyAgreed
//!   | <-- frame(kdc public) ----- |
//!   | <-- frame(IV || ticket) --- |   KeyAgreed -> TicketIssued
//! ```
//!
//! State lives in the connection's own [`TicketExchange`]; nothing is
//! shared between connections except the immutable [`TicketIssuer`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use zkgate_core::{read_frame, write_frame, GatewayConfig};
use zkgate_crypto::{
    derive_session_key, encrypt_ticket, generate_key_pair, GroupParameters, KeyExchangeError,
    KeyPair, SessionKey, Ticket, TicketKey,
};

use crate::error::{GatewayError, GatewayResult};

/// Upper bound on one full exchange, so a silent peer cannot hold a task.
pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    AwaitingPeer,
    KeyAgreed,
    TicketIssued,
}

/// Immutable ticket-issuing material shared by all connections.
#[derive(Debug)]
pub struct TicketIssuer {
    params: GroupParameters,
    ticket_key: TicketKey,
    service_name: String,
}

impl TicketIssuer {
    pub fn new(params: GroupParameters, ticket_key: TicketKey, service_name: String) -> Self {
        Self {
            params,
            ticket_key,
            service_name,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        Ok(Self::new(
            GroupParameters::from_config(&config.group)?,
            TicketKey::from_hex(&config.ticket.key_hex)?,
            config.ticket.service_name.clone(),
        ))
    }

    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    pub fn begin(&self) -> TicketExchange<'_> {
        TicketExchange {
            issuer: self,
            state: ExchangeState::AwaitingPeer,
            session_key: None,
        }
    }
}

/// Per-connection exchange state machine.
pub struct TicketExchange<'a> {
    issuer: &'a TicketIssuer,
    state: ExchangeState,
    session_key: Option<SessionKey>,
}

impl<'a> TicketExchange<'a> {
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Take the client's public value; returns the KDC public value to send.
    pub fn accept_peer(&mut self, peer_bytes: &[u8]) -> GatewayResult<Vec<u8>> {
        self.expect(ExchangeState::AwaitingPeer)?;
        let params = &self.issuer.params;

        let peer = params.decode_public(peer_bytes)?;
        let mut key_pair: KeyPair = generate_key_pair(params);
        let shared = key_pair.compute_shared_secret(params, &peer)?;
        self.session_key = Some(derive_session_key(&shared));
        self.state = ExchangeState::KeyAgreed;

        Ok(params.encode_public(&key_pair.public))
    }

    /// Encrypt the ticket for the agreed session key.
    pub fn issue_ticket(&mut self) -> GatewayResult<Vec<u8>> {
        self.expect(ExchangeState::KeyAgreed)?;
        let session_key = self.session_key.take().ok_or_else(|| {
            KeyExchangeError::InvalidState("session key missing after agreement".into())
        })?;

        let fingerprint = session_key.fingerprint();
        let ticket = Ticket::new(session_key, self.issuer.service_name.clone());
        let blob = encrypt_ticket(&ticket, &self.issuer.ticket_key)?;
        self.state = ExchangeState::TicketIssued;

        debug!(session = %fingerprint, service = %ticket.service_name, "Ticket issued");
        Ok(blob)
    }

    fn expect(&self, wanted: ExchangeState) -> GatewayResult<()> {
        if self.state != wanted {
            return Err(KeyExchangeError::InvalidState(format!(
                "expected {:?}, exchange is {:?}",
                wanted, self.state
            ))
            .into());
        }
        Ok(())
    }
}

/// Run one exchange over an accepted stream.
pub async fn handle_connection<S>(issuer: &TicketIssuer, stream: &mut S) -> GatewayResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut exchange = issuer.begin();

    let peer = read_frame(stream).await?;
    let reply = exchange.accept_peer(&peer)?;
    write_frame(stream, &reply).await?;

    let ticket = exchange.issue_ticket()?;
    write_frame(stream, &ticket).await?;
    Ok(())
}

/// Run one exchange, giving up once `limit` elapses.
pub async fn handle_connection_within<S>(
    issuer: &TicketIssuer,
    stream: &mut S,
    limit: Duration,
) -> GatewayResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tokio::time::timeout(limit, handle_connection(issuer, stream))
        .await
        .unwrap_or(Err(GatewayError::ExchangeTimeout))
}

/// Accept loop: one task per connection, errors stay local to it.
pub async fn serve(listener: TcpListener, issuer: Arc<TicketIssuer>) {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".into());
    info!(addr = %local, "Ticket channel listening");

    loop {
        let (mut stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "Failed to accept ticket connection");
                continue;
            }
        };

        let issuer = Arc::clone(&issuer);
        tokio::spawn(async move {
            let result =
                handle_connection_within(&issuer, &mut stream, EXCHANGE_TIMEOUT).await;
            log_outcome(peer, result);
        });
    }
}

fn log_outcome(peer: SocketAddr, result: GatewayResult<()>) {
    match result {
        Ok(()) => info!(%peer, "Ticket exchange complete"),
        Err(e) => warn!(%peer, error = %e, "Ticket exchange aborted"),
    }
}
