//! Core entity and state types for tenant issuer onboarding.
//!
//! This module defines the two persisted entities the engine advances: a
//! [`TenantWorkflow`] tracking the onboarding attempt and a [`TenantIssuer`]
//! accumulating the endorser connection and public DID. Alongside them live
//! the state enums that gate every transition.
//!
//! # State Progressions
//!
//! All three state enums are monotonic and never revert:
//!
//! - [`WorkflowState`]: `Pending → Active → {Completed | Error}`
//! - [`ConnectionState`]: mirrors the agent's connection protocol; the engine
//!   only distinguishes "ready" states (`Active`/`Completed`) from the rest
//! - [`PublicDidState`]: `Private → Requested → Public`
//!
//! # Examples
//!
//! ```rust
//! use tenon::models::{ConnectionState, TenantWorkflow, WorkflowState};
//! use uuid::Uuid;
//!
//! let workflow = TenantWorkflow::new(Uuid::new_v4());
//! assert_eq!(workflow.workflow_state, WorkflowState::Pending);
//! assert!(!workflow.workflow_state.is_terminal());
//!
//! assert!(ConnectionState::Active.is_ready());
//! assert!(!ConnectionState::Request.is_ready());
//! ```

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Raised when a stored or incoming state string is not a known variant.
#[derive(Debug, Error, Diagnostic)]
#[error("unrecognized {kind} state: {value}")]
#[diagnostic(code(tenon::models::unknown_state))]
pub struct UnknownState {
    pub kind: &'static str,
    pub value: String,
}

/// Lifecycle of one tenant onboarding attempt.
///
/// Monotonic: `Pending → Active → {Completed | Error}`. A workflow in a
/// terminal state is never advanced again and triggers no agent calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Pending,
    Active,
    Completed,
    Error,
}

impl WorkflowState {
    /// True for `Completed` and `Error`: no further transitions exist.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Completed | WorkflowState::Error)
    }

    /// Wire/storage form of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Pending => "pending",
            WorkflowState::Active => "active",
            WorkflowState::Completed => "completed",
            WorkflowState::Error => "error",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WorkflowState::Pending),
            "active" => Ok(WorkflowState::Active),
            "completed" => Ok(WorkflowState::Completed),
            "error" => Ok(WorkflowState::Error),
            other => Err(UnknownState {
                kind: "workflow",
                value: other.to_string(),
            }),
        }
    }
}

/// Connection protocol states reported by the identity agent.
///
/// The set mirrors the agent's own protocol; the engine treats it as opaque
/// except for the two "ready" states that unlock promotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Invitation,
    Request,
    Response,
    Active,
    Completed,
    Error,
    Abandoned,
}

impl ConnectionState {
    /// True once the connection can carry endorsement traffic.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Active | ConnectionState::Completed)
    }

    /// Wire/storage form of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Invitation => "invitation",
            ConnectionState::Request => "request",
            ConnectionState::Response => "response",
            ConnectionState::Active => "active",
            ConnectionState::Completed => "completed",
            ConnectionState::Error => "error",
            ConnectionState::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invitation" => Ok(ConnectionState::Invitation),
            "request" => Ok(ConnectionState::Request),
            "response" => Ok(ConnectionState::Response),
            "active" => Ok(ConnectionState::Active),
            "completed" => Ok(ConnectionState::Completed),
            "error" => Ok(ConnectionState::Error),
            "abandoned" => Ok(ConnectionState::Abandoned),
            other => Err(UnknownState {
                kind: "connection",
                value: other.to_string(),
            }),
        }
    }
}

/// Visibility of the tenant's DID on the ledger, monotonic forward only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicDidState {
    /// Created in the wallet, not yet submitted for a ledger write.
    Private,
    /// Submitted through the endorsed-write capability; awaiting endorsement.
    Requested,
    /// Resolvable on the ledger.
    Public,
}

impl PublicDidState {
    /// Wire/storage form of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicDidState::Private => "private",
            PublicDidState::Requested => "requested",
            PublicDidState::Public => "public",
        }
    }
}

impl fmt::Display for PublicDidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicDidState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(PublicDidState::Private),
            "requested" => Ok(PublicDidState::Requested),
            "public" => Ok(PublicDidState::Public),
            other => Err(UnknownState {
                kind: "public DID",
                value: other.to_string(),
            }),
        }
    }
}

/// One tenant onboarding attempt.
///
/// Created externally (in `Pending`) before the engine is ever invoked,
/// mutated only by the engine afterwards, never deleted by it. The bearer
/// token is held for the duration of onboarding and cleared when the
/// workflow completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TenantWorkflow {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub workflow_state: WorkflowState,
    pub wallet_bearer_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantWorkflow {
    /// Fresh `Pending` workflow for the given wallet.
    #[must_use]
    pub fn new(wallet_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            workflow_state: WorkflowState::Pending,
            wallet_bearer_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Same, but carrying the tenant's bearer token for the run.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.wallet_bearer_token = Some(token.into());
        self
    }
}

/// Issuer configuration accumulated while a tenant is onboarded.
///
/// Created externally alongside its workflow; every field after creation is
/// written exclusively by the engine via read-modify-write store updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TenantIssuer {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub wallet_id: Uuid,
    /// 1:1 link to the onboarding workflow, set on the first engine step.
    pub workflow_id: Option<Uuid>,
    pub endorser_connection_id: Option<String>,
    pub endorser_connection_state: Option<ConnectionState>,
    pub public_did: Option<String>,
    pub public_did_state: Option<PublicDidState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantIssuer {
    /// Fresh issuer record with no connection or DID yet.
    #[must_use]
    pub fn new(tenant_id: Uuid, wallet_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            wallet_id,
            workflow_id: None,
            endorser_connection_id: None,
            endorser_connection_state: None,
            public_did: None,
            public_did_state: None,
            created_at: now,
            updated_at: now,
        }
    }
}
