//! Volatile store backends for tests and development.

use async_trait::async_trait;
use chrono::Utc;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    IssuerUpdate, Result, StoreError, TenantIssuerStore, TenantWorkflowStore, WorkflowUpdate,
};
use crate::models::{TenantIssuer, TenantWorkflow};

/// In-memory [`TenantWorkflowStore`].
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    rows: RwLock<FxHashMap<Uuid, TenantWorkflow>>,
}

impl InMemoryWorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record. Creation happens outside the engine (tenant
    /// provisioning); this is that path for tests and development.
    pub async fn insert(&self, workflow: TenantWorkflow) {
        self.rows.write().await.insert(workflow.id, workflow);
    }
}

#[async_trait]
impl TenantWorkflowStore for InMemoryWorkflowStore {
    async fn get(&self, id: Uuid) -> Result<TenantWorkflow> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "tenant workflow",
                id: id.to_string(),
            })
    }

    async fn update(&self, patch: WorkflowUpdate) -> Result<TenantWorkflow> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&patch.id).ok_or_else(|| StoreError::NotFound {
            entity: "tenant workflow",
            id: patch.id.to_string(),
        })?;
        row.workflow_state = patch.workflow_state;
        row.wallet_bearer_token = patch.wallet_bearer_token;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

/// In-memory [`TenantIssuerStore`].
#[derive(Default)]
pub struct InMemoryIssuerStore {
    rows: RwLock<FxHashMap<Uuid, TenantIssuer>>,
}

impl InMemoryIssuerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, keyed by issuer id.
    pub async fn insert(&self, issuer: TenantIssuer) {
        self.rows.write().await.insert(issuer.id, issuer);
    }
}

#[async_trait]
impl TenantIssuerStore for InMemoryIssuerStore {
    async fn get_by_wallet_id(&self, wallet_id: Uuid) -> Result<TenantIssuer> {
        self.rows
            .read()
            .await
            .values()
            .find(|issuer| issuer.wallet_id == wallet_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "tenant issuer",
                id: wallet_id.to_string(),
            })
    }

    async fn update(&self, patch: IssuerUpdate) -> Result<TenantIssuer> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&patch.id).ok_or_else(|| StoreError::NotFound {
            entity: "tenant issuer",
            id: patch.id.to_string(),
        })?;
        row.workflow_id = patch.workflow_id;
        row.endorser_connection_id = patch.endorser_connection_id;
        row.endorser_connection_state = patch.endorser_connection_state;
        row.public_did = patch.public_did;
        row.public_did_state = patch.public_did_state;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}
