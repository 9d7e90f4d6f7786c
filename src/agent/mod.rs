//! Capability facade over the external identity agent.
//!
//! The engine never talks to the agent's wire API directly; it depends on the
//! narrow [`AgentClient`] trait plus the [`BootstrapRegistrar`] used when the
//! endorsed ledger-write protocol is unavailable. [`acapy::AcapyClient`] is
//! the production implementation against the ACA-Py admin API; tests supply
//! scripted fakes.
//!
//! # Error Handling
//!
//! Transport and protocol failures surface as [`AgentError`] and abort the
//! current engine step. The one deliberate exception is nym registration:
//! its rejection is a *data outcome* ([`NymRegistration::Unsupported`]) that
//! selects the fallback path, not an error.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::models::ConnectionState;

pub mod acapy;
pub mod bootstrap;

pub use acapy::AcapyClient;
pub use bootstrap::{BootstrapRegistrar, HttpBootstrapRegistrar, registration_url};

/// Connection role tag for a tenant that authors transactions requiring
/// endorsement.
pub const TRANSACTION_AUTHOR: &str = "TRANSACTION_AUTHOR";

/// Connection record returned when an endorser connection is initiated.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ConnectionInvitation {
    pub connection_id: String,
    pub state: ConnectionState,
}

/// A DID and its verification key, fresh out of the agent's wallet.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DidInfo {
    pub did: String,
    pub verkey: String,
}

/// Outcome of a nym registration submitted through the agent's
/// endorsed-write capability.
///
/// `Unsupported` means the agent cannot drive the write through the endorser
/// protocol; the caller recovers by registering against the bootstrap ledger
/// endpoint instead. It is never an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NymRegistration {
    Accepted,
    Unsupported,
}

#[derive(Debug, Error, Diagnostic)]
pub enum AgentError {
    #[error("failed to build agent HTTP client: {0}")]
    #[diagnostic(code(tenon::agent::client))]
    Client(#[source] reqwest::Error),

    #[error("agent request failed ({operation}): {source}")]
    #[diagnostic(
        code(tenon::agent::transport),
        help("Check that the agent admin endpoint is reachable and responsive.")
    )]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("agent rejected {operation}: status {status}")]
    #[diagnostic(code(tenon::agent::rejected))]
    Rejected {
        operation: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("malformed agent response ({operation}): {source}")]
    #[diagnostic(code(tenon::agent::decode))]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

pub type Result<T> = std::result::Result<T, AgentError>;

/// The agent capabilities the onboarding engine depends on.
///
/// Transport, serialization and authentication are implementation concerns;
/// the engine sees only this signature set.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Initiate a connection to the endorser identified by its public DID,
    /// labeled with the given alias.
    async fn create_connection_invitation(
        &self,
        alias: &str,
        their_public_did: &str,
    ) -> Result<ConnectionInvitation>;

    /// Tag this side's role on the connection (see [`TRANSACTION_AUTHOR`]).
    async fn set_connection_role(&self, connection_id: &str, role: &str) -> Result<()>;

    /// Record the endorser's public DID and display alias on the connection.
    async fn set_endorser_info(
        &self,
        connection_id: &str,
        endorser_did: &str,
        endorser_alias: &str,
    ) -> Result<()>;

    /// Create a new DID in the agent's wallet.
    async fn create_did(&self) -> Result<DidInfo>;

    /// Submit a nym registration through the endorsed ledger-write
    /// capability.
    async fn register_nym(&self, did: &str, verkey: &str, alias: &str) -> Result<NymRegistration>;

    /// Force-publish the DID as the wallet's public DID.
    async fn publish_did(&self, did: &str) -> Result<()>;
}
