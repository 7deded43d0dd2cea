//! Client side of the ticket channel.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info};

use zkgate_core::{read_frame, write_frame, GatewayConfig};
use zkgate_crypto::{
    decrypt_ticket, derive_session_key, generate_key_pair, GroupParameters, SessionKey, Ticket,
    TicketKey,
};

use crate::error::{ClientError, ClientResult};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the DH exchange against a KDC and opens the issued ticket.
#[derive(Debug, Clone)]
pub struct TicketClient {
    params: GroupParameters,
    ticket_key: TicketKey,
}

impl TicketClient {
    pub fn new(params: GroupParameters, ticket_key: TicketKey) -> Self {
        Self { params, ticket_key }
    }

    /// Group and ticket key taken from the same configuration the KDC uses.
    pub fn from_config(config: &GatewayConfig) -> ClientResult<Self> {
        let params = GroupParameters::from_config(&config.group)?;
        let ticket_key = TicketKey::from_hex(&config.ticket.key_hex)?;
        Ok(Self::new(params, ticket_key))
    }

    /// Connect, agree on a session key and receive the ticket.
    pub async fn obtain_ticket(&self, addr: SocketAddr) -> ClientResult<(SessionKey, Ticket)> {
        let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::ConnectTimeout { addr })?
            .map_err(|source| ClientError::Connect { addr, source })?;

        let (session_key, ticket) = self.exchange(&mut stream).await?;
        info!(
            %addr,
            service = %ticket.service_name,
            session = %session_key.fingerprint(),
            "Ticket obtained"
        );
        Ok((session_key, ticket))
    }

    /// Exchange over an already established stream.
    pub async fn exchange<S>(&self, stream: &mut S) -> ClientResult<(SessionKey, Ticket)>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut key_pair = generate_key_pair(&self.params);
        write_frame(stream, &self.params.encode_public(&key_pair.public)).await?;

        let peer = self.params.decode_public(&read_frame(stream).await?)?;
        let shared = key_pair.compute_shared_secret(&self.params, &peer)?;
        let session_key = derive_session_key(&shared);
        debug!(session = %session_key.fingerprint(), "Key agreed");

        let ticket = decrypt_ticket(&read_frame(stream).await?, &self.ticket_key)?;
        Ok((session_key, ticket))
    }
}
