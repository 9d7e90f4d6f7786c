//! The promotion sequence: endorsement tagging, DID creation, ledger
//! registration, and the bootstrap fallback.

use tenon::agent::NymRegistration;
use tenon::models::{ConnectionState, PublicDidState, WorkflowState};

mod common;
use common::*;

#[tokio::test]
async fn ready_connection_runs_the_primary_path() {
    let (workflow, issuer) = active_pair(ConnectionState::Request);
    let tenant_id = issuer.tenant_id;
    let h = harness(
        ScriptedAgent::new(),
        ScriptedRegistrar::new(),
        workflow,
        issuer,
    )
    .await;

    let event = connections_event(CONNECTION_ID, "active");
    let updated = h.engine.run_step(h.workflow.id, Some(event)).await.unwrap();

    // Primary success leaves the workflow active; the DID sits in
    // `requested` awaiting endorsement.
    assert_eq!(updated.workflow_state, WorkflowState::Active);
    let issuer = h.issuer_snapshot().await;
    let did = h.agent.did();
    assert_eq!(issuer.endorser_connection_state, Some(ConnectionState::Active));
    assert_eq!(issuer.public_did.as_deref(), Some(did.did.as_str()));
    assert_eq!(issuer.public_did_state, Some(PublicDidState::Requested));

    let config = onboarding_config();
    assert_eq!(
        h.agent.calls(),
        vec![
            format!("set-connection-role {CONNECTION_ID} TRANSACTION_AUTHOR"),
            format!(
                "set-endorser-info {CONNECTION_ID} {} {}",
                config.endorser_public_did, config.endorser_alias
            ),
            "create-did".to_string(),
            format!("register-nym {} {} {tenant_id}", did.did, did.verkey),
        ]
    );
    assert!(h.registrar.calls().is_empty());
}

#[tokio::test]
async fn unsupported_nym_write_takes_the_bootstrap_path() {
    let (workflow, issuer) = active_pair(ConnectionState::Request);
    let tenant_id = issuer.tenant_id;
    let h = harness(
        ScriptedAgent::new().with_nym(NymRegistration::Unsupported),
        ScriptedRegistrar::new(),
        workflow,
        issuer,
    )
    .await;

    let event = connections_event(CONNECTION_ID, "active");
    let updated = h.engine.run_step(h.workflow.id, Some(event)).await.unwrap();

    assert_eq!(updated.workflow_state, WorkflowState::Completed);
    assert_eq!(updated.wallet_bearer_token, None, "token cleared on completion");

    let issuer = h.issuer_snapshot().await;
    assert_eq!(issuer.public_did_state, Some(PublicDidState::Public));

    let did = h.agent.did();
    assert_eq!(
        h.registrar.calls(),
        vec![format!("register-did {} {} {tenant_id}", did.did, did.verkey)]
    );
    assert_eq!(
        h.agent.calls().last().unwrap(),
        &format!("publish-did {}", did.did)
    );
}

#[tokio::test]
async fn completed_connection_state_also_qualifies() {
    let (workflow, issuer) = active_pair(ConnectionState::Response);
    let h = harness(
        ScriptedAgent::new(),
        ScriptedRegistrar::new(),
        workflow,
        issuer,
    )
    .await;

    let event = connections_event(CONNECTION_ID, "completed");
    h.engine.run_step(h.workflow.id, Some(event)).await.unwrap();

    let issuer = h.issuer_snapshot().await;
    assert_eq!(issuer.public_did_state, Some(PublicDidState::Requested));
}

#[tokio::test]
async fn redelivered_ready_event_does_not_rerun_promotion() {
    let (workflow, issuer) = active_pair(ConnectionState::Request);
    let h = harness(
        ScriptedAgent::new(),
        ScriptedRegistrar::new(),
        workflow,
        issuer,
    )
    .await;

    let event = connections_event(CONNECTION_ID, "active");
    h.engine
        .run_step(h.workflow.id, Some(event.clone()))
        .await
        .unwrap();
    let calls_after_first = h.agent.calls().len();

    // The persisted DID is the idempotency marker: an identical redelivery
    // must neither write nor touch the agent again.
    h.engine.run_step(h.workflow.id, Some(event)).await.unwrap();

    assert_eq!(h.agent.calls().len(), calls_after_first);
    let issuer = h.issuer_snapshot().await;
    assert_eq!(issuer.public_did_state, Some(PublicDidState::Requested));
}

#[tokio::test]
async fn failure_mid_promotion_is_recovered_by_redelivery() {
    let (workflow, issuer) = active_pair(ConnectionState::Request);
    let h = harness(
        ScriptedAgent::new().failing_once_at("create-did"),
        ScriptedRegistrar::new(),
        workflow,
        issuer,
    )
    .await;

    let event = connections_event(CONNECTION_ID, "active");
    let err = h
        .engine
        .run_step(h.workflow.id, Some(event.clone()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("create-did"));

    // The connection-state write before the failure stands; no DID yet.
    let stored = h.issuer_snapshot().await;
    assert_eq!(stored.endorser_connection_state, Some(ConnectionState::Active));
    assert_eq!(stored.public_did, None);

    // The redelivered event finds an unchanged connection state and no DID,
    // so promotion runs again from the top and completes this time.
    h.engine.run_step(h.workflow.id, Some(event)).await.unwrap();
    let recovered = h.issuer_snapshot().await;
    assert_eq!(recovered.public_did_state, Some(PublicDidState::Requested));
    assert_eq!(
        h.agent
            .calls()
            .iter()
            .filter(|call| call.as_str() == "create-did")
            .count(),
        2
    );
}

#[tokio::test]
async fn registrar_failure_surfaces_and_keeps_workflow_active() {
    let (workflow, issuer) = active_pair(ConnectionState::Request);
    let h = harness(
        ScriptedAgent::new().with_nym(NymRegistration::Unsupported),
        ScriptedRegistrar::failing(),
        workflow,
        issuer,
    )
    .await;

    let event = connections_event(CONNECTION_ID, "active");
    let err = h.engine.run_step(h.workflow.id, Some(event)).await.unwrap_err();
    assert!(matches!(err, tenon::engine::EngineError::Registrar(_)));

    // The DID was persisted as private before the fallback began; the
    // workflow never completed.
    let workflow = h.workflow_snapshot().await;
    assert_eq!(workflow.workflow_state, WorkflowState::Active);
    let issuer = h.issuer_snapshot().await;
    assert_eq!(issuer.public_did_state, Some(PublicDidState::Private));
}
