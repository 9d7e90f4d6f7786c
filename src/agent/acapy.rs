//! ACA-Py admin API implementation of [`AgentClient`].
//!
//! Endpoint shapes follow the agent's admin interface: parameters travel as
//! query strings, bodies are JSON. Responses the engine needs are decoded
//! into the types in [`crate::agent`]; everything else is discarded after a
//! status check.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::{AgentClient, AgentError, ConnectionInvitation, DidInfo, NymRegistration, Result};
use crate::config::AcapySettings;

/// HTTP client for the ACA-Py admin API.
///
/// Construct once per process and share (it is `Send + Sync` and internally
/// pooled); every request carries the configured bounded timeout and, when
/// set, the admin `x-api-key` header.
pub struct AcapyClient {
    http: reqwest::Client,
    admin_url: String,
    api_key: Option<String>,
}

impl AcapyClient {
    pub fn new(settings: &AcapySettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(AgentError::Client)?;
        Ok(Self {
            http,
            admin_url: settings.admin_url.trim_end_matches('/').to_string(),
            api_key: settings.admin_api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let request = match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|source| AgentError::Transport { operation, source })
    }

    /// Send and require a success status, discarding the body.
    async fn post_expect_ok(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<()> {
        let response = self.send(operation, request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Rejected { operation, status });
        }
        debug!(operation, %status, "agent call succeeded");
        Ok(())
    }
}

#[derive(Deserialize)]
struct DidCreateResponse {
    result: DidInfo,
}

#[async_trait::async_trait]
impl AgentClient for AcapyClient {
    #[instrument(skip(self), err)]
    async fn create_connection_invitation(
        &self,
        alias: &str,
        their_public_did: &str,
    ) -> Result<ConnectionInvitation> {
        let operation = "create-connection-invitation";
        let request = self
            .http
            .post(self.endpoint("/didexchange/create-request"))
            .query(&[("their_public_did", their_public_did), ("alias", alias)]);
        let response = self.send(operation, request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Rejected { operation, status });
        }
        response
            .json::<ConnectionInvitation>()
            .await
            .map_err(|source| AgentError::Decode { operation, source })
    }

    #[instrument(skip(self), err)]
    async fn set_connection_role(&self, connection_id: &str, role: &str) -> Result<()> {
        let request = self
            .http
            .post(self.endpoint(&format!("/transactions/{connection_id}/set-endorser-role")))
            .query(&[("transaction_my_job", role)]);
        self.post_expect_ok("set-connection-role", request).await
    }

    #[instrument(skip(self), err)]
    async fn set_endorser_info(
        &self,
        connection_id: &str,
        endorser_did: &str,
        endorser_alias: &str,
    ) -> Result<()> {
        let request = self
            .http
            .post(self.endpoint(&format!("/transactions/{connection_id}/set-endorser-info")))
            .query(&[
                ("endorser_did", endorser_did),
                ("endorser_name", endorser_alias),
            ]);
        self.post_expect_ok("set-endorser-info", request).await
    }

    #[instrument(skip(self), err)]
    async fn create_did(&self) -> Result<DidInfo> {
        let operation = "create-did";
        let request = self
            .http
            .post(self.endpoint("/wallet/did/create"))
            .json(&json!({}));
        let response = self.send(operation, request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Rejected { operation, status });
        }
        let decoded = response
            .json::<DidCreateResponse>()
            .await
            .map_err(|source| AgentError::Decode { operation, source })?;
        Ok(decoded.result)
    }

    /// Any rejection status maps to [`NymRegistration::Unsupported`]: agents
    /// without the endorsed-write protocol report the gap as a request
    /// failure, and the caller's fallback handles both that and genuine
    /// rejections the same way. Transport failures still surface as errors.
    #[instrument(skip(self, verkey), err)]
    async fn register_nym(&self, did: &str, verkey: &str, alias: &str) -> Result<NymRegistration> {
        let request = self
            .http
            .post(self.endpoint("/ledger/register-nym"))
            .query(&[("did", did), ("verkey", verkey), ("alias", alias)]);
        let response = self.send("register-nym", request).await?;
        let status = response.status();
        if status.is_success() {
            Ok(NymRegistration::Accepted)
        } else {
            debug!(%status, "endorsed nym registration rejected");
            Ok(NymRegistration::Unsupported)
        }
    }

    #[instrument(skip(self), err)]
    async fn publish_did(&self, did: &str) -> Result<()> {
        let request = self
            .http
            .post(self.endpoint("/wallet/did/public"))
            .query(&[("did", did)]);
        self.post_expect_ok("publish-did", request).await
    }
}
