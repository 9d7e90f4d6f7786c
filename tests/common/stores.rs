//! Store instrumentation shared by the engine tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use tenon::models::{TenantIssuer, TenantWorkflow};
use tenon::store::{
    InMemoryIssuerStore, InMemoryWorkflowStore, IssuerUpdate, StoreError, TenantIssuerStore,
    TenantWorkflowStore, WorkflowUpdate,
};

/// [`InMemoryIssuerStore`] wrapper counting `update` calls, so tests can
/// assert the no-redundant-write invariant.
#[derive(Default)]
pub struct CountingIssuerStore {
    inner: InMemoryIssuerStore,
    updates: AtomicUsize,
}

impl CountingIssuerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, issuer: TenantIssuer) {
        self.inner.insert(issuer).await;
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantIssuerStore for CountingIssuerStore {
    async fn get_by_wallet_id(&self, wallet_id: uuid::Uuid) -> Result<TenantIssuer, StoreError> {
        self.inner.get_by_wallet_id(wallet_id).await
    }

    async fn update(&self, patch: IssuerUpdate) -> Result<TenantIssuer, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(patch).await
    }
}

/// [`InMemoryWorkflowStore`] wrapper counting `update` calls.
#[derive(Default)]
pub struct CountingWorkflowStore {
    inner: InMemoryWorkflowStore,
    updates: AtomicUsize,
}

impl CountingWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, workflow: TenantWorkflow) {
        self.inner.insert(workflow).await;
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantWorkflowStore for CountingWorkflowStore {
    async fn get(&self, id: uuid::Uuid) -> Result<TenantWorkflow, StoreError> {
        self.inner.get(id).await
    }

    async fn update(&self, patch: WorkflowUpdate) -> Result<TenantWorkflow, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(patch).await
    }
}
