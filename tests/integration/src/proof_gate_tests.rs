//! Proof gate end to end: key fetch, local proving, submission, latching.

use tokio::time::Duration;

use zkgate_client::{ClientError, ProofClient, SubmissionOutcome, TicketClient};
use zkgate_core::RelationKind;
use zkgate_crypto::{compile, prove, Fr, ProofSubmission, PublicValue, Relation, Witness};

use crate::test_utils::start_gateway;

#[tokio::test]
async fn test_proof_gate_end_to_end() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let client = ProofClient::new(gateway.proof_url(), Relation::cubic()).unwrap();
    assert!(!client.is_authorized().await.unwrap());

    // A valid proof of an unrelated statement, claimed for y = 99.
    let pk = client.fetch_proving_key().await.unwrap();
    let unrelated = prove(client.compiled(), &pk, &Witness::from_u64(2, 15)).unwrap();
    let outcome = client.submit(&unrelated, PublicValue::Integer(99)).await.unwrap();
    assert_eq!(outcome, SubmissionOutcome::Rejected);
    assert!(!gateway.latch.is_set());

    // 3^3 + 3 + 5 = 35
    let outcome = client
        .prove_and_submit(Fr::from(3u64), Fr::from(35u64))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Accepted {
            first_authorization: true
        }
    );
    assert!(gateway.latch.is_set());

    gateway.finish().await.unwrap();

    // Proof channel is gone.
    assert!(matches!(
        client.fetch_proving_key().await,
        Err(ClientError::Http { .. })
    ));
}

#[tokio::test]
async fn test_ticket_channel_survives_authorization() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let proof_client = ProofClient::new(gateway.proof_url(), Relation::cubic()).unwrap();
    let ticket_client = TicketClient::from_config(&gateway.config).unwrap();
    let ticket_addr = gateway.ticket_addr;

    let outcome = proof_client
        .prove_and_submit(Fr::from(3u64), Fr::from(35u64))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Accepted { .. }));

    // Drain the proof channel but keep the ticket task alive.
    let ticket_task = tokio::time::timeout(Duration::from_secs(10), gateway.run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let (session_key, ticket) = ticket_client.obtain_ticket(ticket_addr).await.unwrap();
    assert_eq!(ticket.session_key, session_key);
    ticket_task.abort();
}

#[tokio::test]
async fn test_wrong_public_input_is_rejected() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let client = ProofClient::new(gateway.proof_url(), Relation::cubic()).unwrap();
    let pk = client.fetch_proving_key().await.unwrap();

    let proof = prove(client.compiled(), &pk, &Witness::from_u64(3, 35)).unwrap();
    for y in [32u64, 36, 0] {
        let outcome = client.submit(&proof, PublicValue::Integer(y)).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::Rejected, "y = {}", y);
    }
    assert!(!gateway.latch.is_set());
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_malformed_submission() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let client = ProofClient::new(gateway.proof_url(), Relation::cubic()).unwrap();

    let garbage = ProofSubmission {
        proof: "AAAA".to_string(),
        y: PublicValue::Integer(35),
    };
    let outcome = client.submit_raw(&garbage).await.unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Malformed { .. }));

    let huge_y = ProofSubmission {
        proof: "AAAA".to_string(),
        y: PublicValue::Decimal("9".repeat(100)),
    };
    let outcome = client.submit_raw(&huge_y).await.unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Malformed { .. }));

    assert!(!gateway.latch.is_set());
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_client_refuses_foreign_circuit() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let client = ProofClient::new(gateway.proof_url(), Relation::quartic()).unwrap();

    assert!(matches!(
        client.fetch_proving_key().await,
        Err(ClientError::CircuitMismatch { .. })
    ));
    assert!(matches!(
        client.fetch_verifying_key().await,
        Err(ClientError::CircuitMismatch { .. })
    ));
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_quartic_gateway_accepts_root() {
    let gateway = start_gateway(RelationKind::Quartic).await;
    let client = ProofClient::new(gateway.proof_url(), Relation::quartic()).unwrap();

    let vk = client.fetch_verifying_key().await.unwrap();
    assert_eq!(vk.digest(), compile(Relation::quartic()).unwrap().digest());

    let outcome = client
        .prove_and_submit(Fr::from(4093u64), Fr::from(0u64))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Accepted {
            first_authorization: true
        }
    );
    gateway.finish().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_authorize_once() {
    let gateway = start_gateway(RelationKind::Cubic).await;
    let client = ProofClient::new(gateway.proof_url(), Relation::cubic()).unwrap();
    let pk = client.fetch_proving_key().await.unwrap();
    let proof = prove(client.compiled(), &pk, &Witness::from_u64(3, 35)).unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let client = client.clone();
        let proof = proof.clone();
        handles.push(tokio::spawn(async move {
            client.submit(&proof, PublicValue::Integer(35)).await
        }));
    }

    let mut firsts = 0;
    for handle in handles {
        // Submissions racing the drain may find the channel already closed.
        if let Ok(SubmissionOutcome::Accepted {
            first_authorization,
        }) = handle.await.unwrap()
        {
            if first_authorization {
                firsts += 1;
            }
        }
    }
    assert_eq!(firsts, 1);
    gateway.finish().await.unwrap();
}
