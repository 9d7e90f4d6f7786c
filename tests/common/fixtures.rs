//! Entity fixtures and an assembled engine harness.

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use tenon::config::OnboardingConfig;
use tenon::engine::WorkflowEngine;
use tenon::models::{ConnectionState, TenantIssuer, TenantWorkflow, WorkflowState};
use tenon::webhook::WebhookEvent;

use super::agents::{ScriptedAgent, ScriptedRegistrar};
use super::stores::{CountingIssuerStore, CountingWorkflowStore};

pub const CONNECTION_ID: &str = "conn-123";

pub fn onboarding_config() -> OnboardingConfig {
    OnboardingConfig::new(
        "endorser",
        "did:sov:EndorserDid111111111111",
        "http://ledger.example:9000/genesis",
    )
}

/// Fresh pending workflow + issuer pair sharing a wallet, token attached.
pub fn pending_pair() -> (TenantWorkflow, TenantIssuer) {
    let wallet_id = Uuid::new_v4();
    let workflow = TenantWorkflow::new(wallet_id).with_bearer_token("bearer-abc");
    let issuer = TenantIssuer::new(Uuid::new_v4(), wallet_id);
    (workflow, issuer)
}

/// Active workflow whose issuer already holds the endorser connection in the
/// given state.
pub fn active_pair(connection_state: ConnectionState) -> (TenantWorkflow, TenantIssuer) {
    let (mut workflow, mut issuer) = pending_pair();
    workflow.workflow_state = WorkflowState::Active;
    issuer.workflow_id = Some(workflow.id);
    issuer.endorser_connection_id = Some(CONNECTION_ID.to_string());
    issuer.endorser_connection_state = Some(connection_state);
    (workflow, issuer)
}

pub fn connections_event(connection_id: &str, state: &str) -> WebhookEvent {
    WebhookEvent::from_parts(
        "connections",
        json!({"connection_id": connection_id, "state": state}),
    )
}

/// Everything an engine test needs, with handles kept on every collaborator.
pub struct Harness {
    pub engine: Arc<WorkflowEngine>,
    pub workflows: Arc<CountingWorkflowStore>,
    pub issuers: Arc<CountingIssuerStore>,
    pub agent: Arc<ScriptedAgent>,
    pub registrar: Arc<ScriptedRegistrar>,
    pub workflow: TenantWorkflow,
    pub issuer: TenantIssuer,
}

impl Harness {
    pub async fn issuer_snapshot(&self) -> TenantIssuer {
        use tenon::store::TenantIssuerStore;
        self.issuers
            .get_by_wallet_id(self.workflow.wallet_id)
            .await
            .expect("issuer seeded")
    }

    pub async fn workflow_snapshot(&self) -> TenantWorkflow {
        use tenon::store::TenantWorkflowStore;
        self.workflows
            .get(self.workflow.id)
            .await
            .expect("workflow seeded")
    }
}

/// Seed the stores and assemble an engine around the given fakes.
pub async fn harness(
    agent: ScriptedAgent,
    registrar: ScriptedRegistrar,
    workflow: TenantWorkflow,
    issuer: TenantIssuer,
) -> Harness {
    let workflows = Arc::new(CountingWorkflowStore::new());
    let issuers = Arc::new(CountingIssuerStore::new());
    workflows.insert(workflow.clone()).await;
    issuers.insert(issuer.clone()).await;

    let agent = Arc::new(agent);
    let registrar = Arc::new(registrar);
    let engine = Arc::new(WorkflowEngine::new(
        workflows.clone(),
        issuers.clone(),
        agent.clone(),
        registrar.clone(),
        onboarding_config(),
    ));

    Harness {
        engine,
        workflows,
        issuers,
        agent,
        registrar,
        workflow,
        issuer,
    }
}
