//! Record stores for workflow and issuer entities.
//!
//! The stores are the sole source of truth: the engine re-fetches current
//! snapshots at the start of every step and never trusts in-memory values
//! from a prior one. Updates are read-modify-write, atomic per record, and
//! deliberately *not* joined transactionally across the two entities; the
//! next step always re-reads whatever actually landed.
//!
//! # Patch Semantics
//!
//! [`WorkflowUpdate`] and [`IssuerUpdate`] are full-field update records for
//! the engine-owned columns: they carry the new value for every such column
//! and are written as given. An absent optional value writes NULL, which is
//! how the bearer token is cleared on completion. Build issuer patches with
//! [`IssuerUpdate::carrying`] so unchanged fields travel forward from the
//! current snapshot.
//!
//! # Backends
//!
//! - [`memory`]: volatile `FxHashMap` stores for tests and development.
//! - [`sqlite`]: durable `sqlx` stores behind the `sqlite` feature.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ConnectionState, PublicDidState, TenantIssuer, TenantWorkflow, UnknownState, WorkflowState,
};

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{InMemoryIssuerStore, InMemoryWorkflowStore};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteIssuerStore, SqliteWorkflowStore, connect};

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    #[diagnostic(code(tenon::store::not_found))]
    NotFound { entity: &'static str, id: String },

    /// A stored state string no longer maps to a known variant.
    #[error(transparent)]
    #[diagnostic(code(tenon::store::corrupt))]
    Corrupt(#[from] UnknownState),

    /// A stored column failed to parse back into its domain type.
    #[error("invalid {column} in stored row: {value}")]
    #[diagnostic(code(tenon::store::invalid_column))]
    InvalidColumn { column: &'static str, value: String },

    #[cfg(feature = "sqlite")]
    #[error("database error: {0}")]
    #[diagnostic(code(tenon::store::database))]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "sqlite")]
    #[error("migration error: {0}")]
    #[diagnostic(code(tenon::store::migrate))]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Full-field update for the engine-owned workflow columns.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowUpdate {
    pub id: Uuid,
    pub workflow_state: WorkflowState,
    /// Written as given; `None` clears the stored token.
    pub wallet_bearer_token: Option<String>,
}

/// Full-field update for the engine-owned issuer columns.
#[derive(Clone, Debug, PartialEq)]
pub struct IssuerUpdate {
    pub id: Uuid,
    pub workflow_id: Option<Uuid>,
    pub endorser_connection_id: Option<String>,
    pub endorser_connection_state: Option<ConnectionState>,
    pub public_did: Option<String>,
    pub public_did_state: Option<PublicDidState>,
}

impl IssuerUpdate {
    /// Start from the current snapshot, carrying every engine-owned field
    /// forward unchanged.
    #[must_use]
    pub fn carrying(issuer: &TenantIssuer) -> Self {
        Self {
            id: issuer.id,
            workflow_id: issuer.workflow_id,
            endorser_connection_id: issuer.endorser_connection_id.clone(),
            endorser_connection_state: issuer.endorser_connection_state,
            public_did: issuer.public_did.clone(),
            public_did_state: issuer.public_did_state,
        }
    }

    /// Link the issuer to its onboarding workflow.
    #[must_use]
    pub fn with_workflow(mut self, workflow_id: Uuid) -> Self {
        self.workflow_id = Some(workflow_id);
        self
    }

    /// Record a freshly initiated endorser connection.
    #[must_use]
    pub fn with_connection(mut self, connection_id: impl Into<String>, state: ConnectionState) -> Self {
        self.endorser_connection_id = Some(connection_id.into());
        self.endorser_connection_state = Some(state);
        self
    }

    /// Advance the stored connection state.
    #[must_use]
    pub fn with_connection_state(mut self, state: ConnectionState) -> Self {
        self.endorser_connection_state = Some(state);
        self
    }

    /// Record the created DID and its visibility.
    #[must_use]
    pub fn with_public_did(mut self, did: impl Into<String>, state: PublicDidState) -> Self {
        self.public_did = Some(did.into());
        self.public_did_state = Some(state);
        self
    }

    /// Advance the DID's visibility.
    #[must_use]
    pub fn with_public_did_state(mut self, state: PublicDidState) -> Self {
        self.public_did_state = Some(state);
        self
    }
}

/// Storage for [`TenantWorkflow`] records.
#[async_trait]
pub trait TenantWorkflowStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<TenantWorkflow>;

    /// Apply the patch and return the updated snapshot. Stamps `updated_at`.
    async fn update(&self, patch: WorkflowUpdate) -> Result<TenantWorkflow>;
}

/// Storage for [`TenantIssuer`] records, addressed by wallet.
#[async_trait]
pub trait TenantIssuerStore: Send + Sync {
    async fn get_by_wallet_id(&self, wallet_id: Uuid) -> Result<TenantIssuer>;

    /// Apply the patch and return the updated snapshot. Stamps `updated_at`.
    async fn update(&self, patch: IssuerUpdate) -> Result<TenantIssuer>;
}
