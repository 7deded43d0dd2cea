//! Ticket channel over real TCP.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use zkgate_client::{ClientError, TicketClient};
use zkgate_core::{read_frame, write_frame, RelationKind, WireError};
use zkgate_crypto::{GroupParameters, TicketKey};

use crate::test_utils::start_gateway;

#[tokio::test]
async fn test_ticket_round_trip() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let client = TicketClient::from_config(&gateway.config).unwrap();

    let (session_key, ticket) = client.obtain_ticket(gateway.ticket_addr).await.unwrap();
    assert_eq!(ticket.session_key, session_key);
    assert_eq!(ticket.service_name, gateway.config.ticket.service_name);

    // Ticket issuance does not touch the proof gate.
    assert!(!gateway.latch.is_set());
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_each_connection_gets_a_fresh_session() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let client = TicketClient::from_config(&gateway.config).unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = client.clone();
        let addr = gateway.ticket_addr;
        handles.push(tokio::spawn(async move { client.obtain_ticket(addr).await }));
    }

    let mut fingerprints = Vec::new();
    for handle in handles {
        let (session_key, ticket) = handle.await.unwrap().unwrap();
        assert_eq!(ticket.session_key, session_key);
        fingerprints.push(session_key.fingerprint());
    }
    fingerprints.sort();
    fingerprints.dedup();
    assert_eq!(fingerprints.len(), 4);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_wrong_ticket_key_cannot_open_ticket() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let mut config = gateway.config.clone();
    config.ticket.key_hex = "11".repeat(32);
    let client = TicketClient::from_config(&config).unwrap();

    let result = client.obtain_ticket(gateway.ticket_addr).await;
    assert!(matches!(result, Err(ClientError::Ticket(_))));
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_degenerate_public_value_closes_connection() {
    let gateway = start_gateway(RelationKind::Cubic).await;

    let mut stream = TcpStream::connect(gateway.ticket_addr).await.unwrap();
    write_frame(&mut stream, &[1u8]).await.unwrap();

    // The KDC aborts without replying.
    let result = read_frame(&mut stream).await;
    assert!(matches!(result, Err(WireError::Io(_))));

    // The accept loop is unaffected.
    let client = TicketClient::from_config(&gateway.config).unwrap();
    assert!(client.obtain_ticket(gateway.ticket_addr).await.is_ok());
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_oversized_frame_closes_connection() {
    let gateway = start_gateway(RelationKind::Cubic).await;

    let mut stream = TcpStream::connect(gateway.ticket_addr).await.unwrap();
    stream.write_u32(10 * 1024 * 1024).await.unwrap();
    stream.flush().await.unwrap();

    let result = read_frame(&mut stream).await;
    assert!(matches!(result, Err(WireError::Io(_))));
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_session_key_is_independent_of_ticket_key() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let params = GroupParameters::from_config(&gateway.config.group).unwrap();
    let key = TicketKey::from_hex(&gateway.config.ticket.key_hex).unwrap();
    let client = TicketClient::new(params, key);

    let (session_key, ticket) = client.obtain_ticket(gateway.ticket_addr).await.unwrap();
    let ticket_key = hex::decode(&gateway.config.ticket.key_hex).unwrap();
    assert_ne!(&session_key.as_bytes()[..], &ticket_key[..]);
    assert_eq!(ticket.session_key, session_key);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_releases_both_listeners() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let ticket_addr = gateway.ticket_addr;
    let proof_addr = gateway.proof_addr;
    let client = TicketClient::from_config(&gateway.config).unwrap();
    assert!(client.obtain_ticket(ticket_addr).await.is_ok());

    gateway.shutdown().await;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(TcpStream::connect(ticket_addr).await.is_err());
    assert!(TcpStream::connect(proof_addr).await.is_err());
}
