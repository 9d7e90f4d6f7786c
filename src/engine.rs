//! The tenant issuer onboarding engine.
//!
//! [`WorkflowEngine::run_step`] advances one onboarding workflow by exactly
//! one step per trigger. Triggers come from two places (a direct invocation
//! right after the workflow is created, and webhook deliveries relaying the
//! agent's asynchronous protocol progress) and both reduce to the same call.
//!
//! # Dispatch
//!
//! | workflow state | event | action |
//! |---|---|---|
//! | `Pending` | ignored | activate, initiate endorser connection |
//! | `Active` | `connections` | persist state change; promote when ready |
//! | `Active` | `endorse_transaction` | reserved no-op |
//! | `Active` | other / none | no-op |
//! | `Completed` / `Error` | any | no-op, zero agent calls |
//!
//! # Recovery Model
//!
//! Every persisted update lands before the next external call begins, and
//! each step re-reads current store state instead of trusting a prior
//! invocation. The engine performs no retries of its own (beyond the single
//! ledger-registration fallback branch); failed steps surface to the caller
//! and rely on webhook redelivery to run again, with persisted-state
//! comparisons keeping the re-run from repeating completed work.

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::agent::{
    AgentClient, AgentError, BootstrapRegistrar, DidInfo, NymRegistration, TRANSACTION_AUTHOR,
};
use crate::config::OnboardingConfig;
use crate::models::{PublicDidState, TenantIssuer, TenantWorkflow, WorkflowState};
use crate::store::{
    IssuerUpdate, StoreError, TenantIssuerStore, TenantWorkflowStore, WorkflowUpdate,
};
use crate::webhook::{ConnectionsPayload, WebhookEvent};

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("workflow not found: {0}")]
    #[diagnostic(code(tenon::engine::workflow_not_found))]
    WorkflowNotFound(Uuid),

    #[error("no issuer record for wallet {0}")]
    #[diagnostic(
        code(tenon::engine::issuer_not_found),
        help("Tenant provisioning creates the issuer record; it must exist before the workflow is stepped.")
    )]
    IssuerNotFound(Uuid),

    #[error("agent call failed: {0}")]
    #[diagnostic(code(tenon::engine::agent))]
    Agent(#[from] AgentError),

    #[error("bootstrap ledger registration failed: {0}")]
    #[diagnostic(code(tenon::engine::registrar))]
    Registrar(#[source] AgentError),

    #[error(transparent)]
    #[diagnostic(code(tenon::engine::store))]
    Store(StoreError),
}

/// Advances tenant onboarding workflows one step at a time.
///
/// Construct once per process with its collaborators and share behind an
/// `Arc`; [`run_step`](Self::run_step) calls for *different* workflows run
/// concurrently, while calls for the same workflow are serialized internally.
pub struct WorkflowEngine {
    workflows: Arc<dyn TenantWorkflowStore>,
    issuers: Arc<dyn TenantIssuerStore>,
    agent: Arc<dyn AgentClient>,
    registrar: Arc<dyn BootstrapRegistrar>,
    config: OnboardingConfig,
    step_locks: Mutex<FxHashMap<Uuid, Arc<Mutex<()>>>>,
}

impl WorkflowEngine {
    pub fn new(
        workflows: Arc<dyn TenantWorkflowStore>,
        issuers: Arc<dyn TenantIssuerStore>,
        agent: Arc<dyn AgentClient>,
        registrar: Arc<dyn BootstrapRegistrar>,
        config: OnboardingConfig,
    ) -> Self {
        Self {
            workflows,
            issuers,
            agent,
            registrar,
            config,
            step_locks: Mutex::new(FxHashMap::default()),
        }
    }

    /// Execute the next applicable transition for `workflow_id`.
    ///
    /// Reads fresh workflow and issuer snapshots, dispatches on the workflow
    /// state (and event, when one is present), performs the required agent
    /// calls and persists the results. Returns the workflow as of the last
    /// successful persist; failures after a persist leave that state in
    /// place for the next (redelivered) invocation.
    #[instrument(skip(self, event), fields(workflow_id = %workflow_id), err)]
    pub async fn run_step(
        &self,
        workflow_id: Uuid,
        event: Option<WebhookEvent>,
    ) -> Result<TenantWorkflow, EngineError> {
        // Overlapping deliveries for one workflow would interleave their
        // read-modify-write cycles; serialize them per id.
        let step_lock = self.step_lock(workflow_id).await;
        let _guard = step_lock.lock().await;

        let workflow = self.workflows.get(workflow_id).await.map_err(|err| match err {
            StoreError::NotFound { .. } => EngineError::WorkflowNotFound(workflow_id),
            other => EngineError::Store(other),
        })?;
        let issuer = self
            .issuers
            .get_by_wallet_id(workflow.wallet_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => EngineError::IssuerNotFound(workflow.wallet_id),
                other => EngineError::Store(other),
            })?;

        let result = match workflow.workflow_state {
            WorkflowState::Pending => self.start(workflow, issuer).await,
            WorkflowState::Active => match event {
                Some(WebhookEvent::Connections(payload)) => {
                    self.on_connection_update(workflow, issuer, payload).await
                }
                Some(WebhookEvent::EndorseTransaction(_)) => {
                    // Reserved: endorsement acknowledgments will advance the
                    // Requested DID here once the agent emits them.
                    Ok(workflow)
                }
                Some(WebhookEvent::Unrecognized { topic, .. }) => {
                    warn!(%topic, "ignoring unrecognized webhook topic");
                    Ok(workflow)
                }
                None => Ok(workflow),
            },
            WorkflowState::Completed | WorkflowState::Error => Ok(workflow),
        };

        if let Ok(workflow) = &result
            && workflow.workflow_state.is_terminal()
        {
            self.step_locks.lock().await.remove(&workflow_id);
        }
        result
    }

    async fn step_lock(&self, workflow_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.step_locks.lock().await;
        locks
            .entry(workflow_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// First step: activate the workflow, then initiate the endorser
    /// connection.
    async fn start(
        &self,
        workflow: TenantWorkflow,
        issuer: TenantIssuer,
    ) -> Result<TenantWorkflow, EngineError> {
        // The state flips to Active before the first agent call; a crash in
        // between re-enters on an Active workflow instead of re-inviting.
        let workflow = self
            .workflows
            .update(WorkflowUpdate {
                id: workflow.id,
                workflow_state: WorkflowState::Active,
                wallet_bearer_token: workflow.wallet_bearer_token.clone(),
            })
            .await
            .map_err(EngineError::Store)?;

        let invitation = self
            .agent
            .create_connection_invitation(
                &self.config.endorser_alias,
                &self.config.endorser_public_did,
            )
            .await?;
        info!(
            connection_id = %invitation.connection_id,
            state = %invitation.state,
            "endorser connection initiated"
        );

        self.issuers
            .update(
                IssuerUpdate::carrying(&issuer)
                    .with_workflow(workflow.id)
                    .with_connection(invitation.connection_id, invitation.state),
            )
            .await
            .map_err(EngineError::Store)?;

        Ok(workflow)
    }

    /// Handle a `connections` webhook for an active workflow.
    async fn on_connection_update(
        &self,
        workflow: TenantWorkflow,
        mut issuer: TenantIssuer,
        payload: ConnectionsPayload,
    ) -> Result<TenantWorkflow, EngineError> {
        // Persist only an actual change; identical redeliveries write nothing.
        if issuer.endorser_connection_state != Some(payload.state) {
            issuer = self
                .issuers
                .update(IssuerUpdate::carrying(&issuer).with_connection_state(payload.state))
                .await
                .map_err(EngineError::Store)?;
        }

        // A ready connection unlocks promotion, once: the persisted DID is
        // the idempotency marker that keeps redeliveries from repeating it.
        if payload.state.is_ready() && issuer.public_did.is_none() {
            return self.promote(workflow, issuer, &payload.connection_id).await;
        }

        Ok(workflow)
    }

    /// Promotion sequence: tag the connection for endorsement, create the
    /// DID, and submit it to the ledger.
    async fn promote(
        &self,
        workflow: TenantWorkflow,
        issuer: TenantIssuer,
        connection_id: &str,
    ) -> Result<TenantWorkflow, EngineError> {
        self.agent
            .set_connection_role(connection_id, TRANSACTION_AUTHOR)
            .await?;
        self.agent
            .set_endorser_info(
                connection_id,
                &self.config.endorser_public_did,
                &self.config.endorser_alias,
            )
            .await?;

        let did = self.agent.create_did().await?;
        info!(did = %did.did, "wallet DID created");
        let issuer = self
            .issuers
            .update(
                IssuerUpdate::carrying(&issuer)
                    .with_public_did(did.did.clone(), PublicDidState::Private),
            )
            .await
            .map_err(EngineError::Store)?;

        let alias = issuer.tenant_id.to_string();
        match self.agent.register_nym(&did.did, &did.verkey, &alias).await? {
            NymRegistration::Accepted => {
                self.issuers
                    .update(
                        IssuerUpdate::carrying(&issuer)
                            .with_public_did_state(PublicDidState::Requested),
                    )
                    .await
                    .map_err(EngineError::Store)?;
                info!(did = %did.did, "nym registration submitted for endorsement");
                Ok(workflow)
            }
            NymRegistration::Unsupported => {
                self.finish_via_bootstrap(workflow, issuer, &did, &alias)
                    .await
            }
        }
    }

    /// Fallback sequence: register the DID through the bootstrap ledger
    /// endpoint, publish it, and close out the workflow.
    async fn finish_via_bootstrap(
        &self,
        workflow: TenantWorkflow,
        issuer: TenantIssuer,
        did: &DidInfo,
        alias: &str,
    ) -> Result<TenantWorkflow, EngineError> {
        warn!(
            did = %did.did,
            "endorsed nym write unsupported; registering via bootstrap endpoint"
        );
        self.registrar
            .register_did(&did.did, &did.verkey, alias)
            .await
            .map_err(EngineError::Registrar)?;
        self.agent.publish_did(&did.did).await?;

        self.issuers
            .update(IssuerUpdate::carrying(&issuer).with_public_did_state(PublicDidState::Public))
            .await
            .map_err(EngineError::Store)?;

        let workflow = self
            .workflows
            .update(WorkflowUpdate {
                id: workflow.id,
                workflow_state: WorkflowState::Completed,
                wallet_bearer_token: None,
            })
            .await
            .map_err(EngineError::Store)?;
        info!(workflow_id = %workflow.id, "onboarding completed via bootstrap path");
        Ok(workflow)
    }
}
