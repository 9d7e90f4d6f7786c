//! Scripted agent and registrar fakes that record every capability call.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use tenon::agent::{
    AgentClient, AgentError, BootstrapRegistrar, ConnectionInvitation, DidInfo, NymRegistration,
};
use tenon::models::ConnectionState;

/// In-process [`AgentClient`] returning scripted responses.
///
/// Calls are recorded in order as `"<operation> <args...>"` strings so tests
/// can assert both the sequence and the arguments of the engine's agent
/// traffic.
pub struct ScriptedAgent {
    calls: Mutex<Vec<String>>,
    invitation: ConnectionInvitation,
    did: DidInfo,
    nym: NymRegistration,
    fail_on: Mutex<Option<&'static str>>,
    fail_once: bool,
    delay: Option<Duration>,
}

impl Default for ScriptedAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            invitation: ConnectionInvitation {
                connection_id: "conn-123".to_string(),
                state: ConnectionState::Invitation,
            },
            did: DidInfo {
                did: "WgWxqztrNooG92RXvxSTWv".to_string(),
                verkey: "H3C2AVvLMv6gmMNam3uVAjZpfkcJCwDwnZn6z3wXmqPV".to_string(),
            },
            nym: NymRegistration::Accepted,
            fail_on: Mutex::new(None),
            fail_once: false,
            delay: None,
        }
    }

    pub fn with_nym(mut self, nym: NymRegistration) -> Self {
        self.nym = nym;
        self
    }

    /// Make the named operation fail with a rejected-status error.
    pub fn failing_at(mut self, operation: &'static str) -> Self {
        *self.fail_on.get_mut().unwrap() = Some(operation);
        self
    }

    /// Like [`failing_at`](Self::failing_at), but only the first attempt
    /// fails; retries succeed.
    pub fn failing_once_at(mut self, operation: &'static str) -> Self {
        *self.fail_on.get_mut().unwrap() = Some(operation);
        self.fail_once = true;
        self
    }

    /// Sleep before answering each call; used to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn did(&self) -> DidInfo {
        self.did.clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn gate(&self, operation: &'static str) -> Result<(), AgentError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut fail_on = self.fail_on.lock().unwrap();
        if *fail_on == Some(operation) {
            if self.fail_once {
                *fail_on = None;
            }
            return Err(AgentError::Rejected {
                operation,
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AgentClient for ScriptedAgent {
    async fn create_connection_invitation(
        &self,
        alias: &str,
        their_public_did: &str,
    ) -> Result<ConnectionInvitation, AgentError> {
        self.record(format!(
            "create-connection-invitation {alias} {their_public_did}"
        ));
        self.gate("create-connection-invitation").await?;
        Ok(self.invitation.clone())
    }

    async fn set_connection_role(
        &self,
        connection_id: &str,
        role: &str,
    ) -> Result<(), AgentError> {
        self.record(format!("set-connection-role {connection_id} {role}"));
        self.gate("set-connection-role").await
    }

    async fn set_endorser_info(
        &self,
        connection_id: &str,
        endorser_did: &str,
        endorser_alias: &str,
    ) -> Result<(), AgentError> {
        self.record(format!(
            "set-endorser-info {connection_id} {endorser_did} {endorser_alias}"
        ));
        self.gate("set-endorser-info").await
    }

    async fn create_did(&self) -> Result<DidInfo, AgentError> {
        self.record("create-did".to_string());
        self.gate("create-did").await?;
        Ok(self.did.clone())
    }

    async fn register_nym(
        &self,
        did: &str,
        verkey: &str,
        alias: &str,
    ) -> Result<NymRegistration, AgentError> {
        self.record(format!("register-nym {did} {verkey} {alias}"));
        self.gate("register-nym").await?;
        Ok(self.nym)
    }

    async fn publish_did(&self, did: &str) -> Result<(), AgentError> {
        self.record(format!("publish-did {did}"));
        self.gate("publish-did").await
    }
}

/// Recording [`BootstrapRegistrar`] fake.
pub struct ScriptedRegistrar {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl Default for ScriptedRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRegistrar {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BootstrapRegistrar for ScriptedRegistrar {
    async fn register_did(&self, did: &str, verkey: &str, alias: &str) -> Result<(), AgentError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("register-did {did} {verkey} {alias}"));
        if self.fail {
            return Err(AgentError::Rejected {
                operation: "register-did",
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(())
    }
}
