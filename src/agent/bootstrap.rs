//! Bootstrap ledger registration, used when the agent cannot drive a nym
//! write through the endorser protocol.
//!
//! Development and sandbox ledgers expose a self-serve registration endpoint
//! next to their genesis-transactions URL; swapping the `genesis` path
//! segment for `register` yields it.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

use super::{AgentError, Result};

/// Derive the self-serve registration endpoint from a genesis URL.
///
/// Every `genesis` occurrence is substituted, matching the ledger operators'
/// URL scheme (`.../genesis` → `.../register`).
#[must_use]
pub fn registration_url(genesis_url: &str) -> String {
    genesis_url.replace("genesis", "register")
}

/// Writes a DID straight to the ledger, bypassing endorsement.
#[async_trait]
pub trait BootstrapRegistrar: Send + Sync {
    async fn register_did(&self, did: &str, verkey: &str, alias: &str) -> Result<()>;
}

#[derive(Serialize)]
struct RegisterDidRequest<'a> {
    did: &'a str,
    verkey: &'a str,
    alias: &'a str,
}

/// HTTP implementation of [`BootstrapRegistrar`] against the ledger's
/// registration endpoint.
pub struct HttpBootstrapRegistrar {
    http: reqwest::Client,
    register_url: String,
}

impl HttpBootstrapRegistrar {
    /// Build a registrar for the ledger behind `genesis_url`, with a bounded
    /// request timeout.
    pub fn new(genesis_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AgentError::Client)?;
        Ok(Self {
            http,
            register_url: registration_url(genesis_url),
        })
    }
}

#[async_trait]
impl BootstrapRegistrar for HttpBootstrapRegistrar {
    #[instrument(skip(self, verkey), err)]
    async fn register_did(&self, did: &str, verkey: &str, alias: &str) -> Result<()> {
        let operation = "register-did";
        let response = self
            .http
            .post(&self.register_url)
            .json(&RegisterDidRequest { did, verkey, alias })
            .send()
            .await
            .map_err(|source| AgentError::Transport { operation, source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Rejected { operation, status });
        }
        Ok(())
    }
}
