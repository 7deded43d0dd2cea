//! Client side of the proof channel.

use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};

use zkgate_crypto::{
    compile, prove, CompiledCircuit, Fr, GateProof, GateProvingKey, GateVerifyingKey,
    ProofSubmission, ProvingKeyEnvelope, PublicValue, Relation, SubmissionReceipt,
    VerifyingKeyEnvelope, Witness,
};

use crate::error::{ClientError, ClientResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How the gateway judged a submitted proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// 200: the proof verified.
    Accepted { first_authorization: bool },
    /// 403: well-formed but not a valid proof for `y`.
    Rejected,
    /// 400: the gateway could not decode the submission.
    Malformed { message: String },
}

/// Proof channel client bound to one locally compiled relation.
#[derive(Debug, Clone)]
pub struct ProofClient {
    http: reqwest::Client,
    base_url: String,
    compiled: CompiledCircuit,
}

impl ProofClient {
    pub fn new(base_url: impl Into<String>, relation: Relation) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ClientError::Http {
                endpoint: "client_init".into(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            compiled: compile(relation)?,
        })
    }

    pub fn compiled(&self) -> &CompiledCircuit {
        &self.compiled
    }

    /// `GET /pk`, refusing a key generated for another circuit.
    pub async fn fetch_proving_key(&self) -> ClientResult<GateProvingKey> {
        let envelope: ProvingKeyEnvelope = self.get_json("/pk").await?;
        let pk = envelope.proving_key()?;
        self.check_digest(&pk.digest().to_hex())?;
        Ok(pk)
    }

    /// `GET /vk`, refusing a key generated for another circuit.
    pub async fn fetch_verifying_key(&self) -> ClientResult<GateVerifyingKey> {
        let envelope: VerifyingKeyEnvelope = self.get_json("/vk").await?;
        self.check_digest(&envelope.circuit_digest)?;
        let vk = envelope.verifying_key()?;
        self.check_digest(&vk.digest().to_hex())?;
        Ok(vk)
    }

    /// Fetch the proving key, prove `P(x) = y` locally and submit.
    pub async fn prove_and_submit(&self, x: Fr, y: Fr) -> ClientResult<SubmissionOutcome> {
        let pk = self.fetch_proving_key().await?;
        let compiled = self.compiled.clone();
        let witness = Witness::new(x, y);

        // Proving is CPU-bound.
        let proof = tokio::task::spawn_blocking(move || prove(&compiled, &pk, &witness))
            .await
            .map_err(|e| ClientError::Task(e.to_string()))??;
        debug!(relation = %self.compiled.relation(), "Proof generated");

        self.submit(&proof, PublicValue::from_field(y)).await
    }

    /// `POST /prove` with an existing proof.
    pub async fn submit(&self, proof: &GateProof, y: PublicValue) -> ClientResult<SubmissionOutcome> {
        let body = ProofSubmission::new(proof, y)?;
        self.submit_raw(&body).await
    }

    /// `POST /prove` with an arbitrary submission body.
    pub async fn submit_raw(&self, body: &ProofSubmission) -> ClientResult<SubmissionOutcome> {
        let endpoint = "POST /prove";
        let resp = self
            .http
            .post(self.url("/prove"))
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                endpoint: endpoint.into(),
                source,
            })?;

        match resp.status() {
            StatusCode::OK => {
                let receipt: SubmissionReceipt =
                    resp.json().await.map_err(|source| ClientError::Http {
                        endpoint: endpoint.into(),
                        source,
                    })?;
                info!(
                    first_authorization = receipt.first_authorization,
                    "Proof accepted"
                );
                Ok(SubmissionOutcome::Accepted {
                    first_authorization: receipt.first_authorization,
                })
            }
            StatusCode::FORBIDDEN => {
                warn!("Proof rejected");
                Ok(SubmissionOutcome::Rejected)
            }
            StatusCode::BAD_REQUEST => Ok(SubmissionOutcome::Malformed {
                message: resp.text().await.unwrap_or_default(),
            }),
            status => Err(ClientError::UnexpectedStatus {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    /// `GET /health`; returns whether the gateway has latched authorization.
    pub async fn is_authorized(&self) -> ClientResult<bool> {
        let health: serde_json::Value = self.get_json("/health").await?;
        Ok(health["authorized"].as_bool().unwrap_or(false))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_digest(&self, received: &str) -> ClientResult<()> {
        let expected = self.compiled.digest().to_hex();
        if received != expected {
            return Err(ClientError::CircuitMismatch {
                expected,
                received: received.to_string(),
            });
        }
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let endpoint = format!("GET {}", path);
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| ClientError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus {
                endpoint,
                status,
                body,
            });
        }

        resp.json()
            .await
            .map_err(|source| ClientError::Http { endpoint, source })
    }
}
