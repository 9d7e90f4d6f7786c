//! # Tenon: Tenant Issuer Onboarding Engine
//!
//! Tenon turns a freshly provisioned tenant wallet into a credential-issuing
//! identity by driving it through a multi-step protocol against an external
//! identity agent: connect to a designated Endorser, create a DID, register
//! it on the ledger (endorsed write, with a bootstrap-registration fallback),
//! and promote it to publicly resolvable status.
//!
//! ## Core Concepts
//!
//! - **[`engine::WorkflowEngine`]**: advances one workflow a single step per
//!   trigger; a resumable state machine fed by direct calls and webhook
//!   deliveries
//! - **[`agent::AgentClient`]**: narrow capability facade over the identity
//!   agent (invitations, DIDs, ledger writes, endorsement tagging)
//! - **[`store`]**: record-store traits over the workflow and issuer
//!   entities, with in-memory and SQLite backends
//! - **[`webhook::WebhookEvent`]**: tagged union over the agent's
//!   notification topics, with an explicit unrecognized case
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenon::agent::{AcapyClient, HttpBootstrapRegistrar};
//! use tenon::config::{AcapySettings, OnboardingConfig};
//! use tenon::engine::WorkflowEngine;
//! use tenon::store::{InMemoryIssuerStore, InMemoryWorkflowStore};
//!
//! # async fn example(workflow_id: uuid::Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let config = OnboardingConfig::from_env()?;
//! let settings = AcapySettings::from_env()?;
//!
//! let engine = WorkflowEngine::new(
//!     Arc::new(InMemoryWorkflowStore::new()),
//!     Arc::new(InMemoryIssuerStore::new()),
//!     Arc::new(AcapyClient::new(&settings)?),
//!     Arc::new(HttpBootstrapRegistrar::new(&config.genesis_url, settings.timeout)?),
//!     config,
//! );
//!
//! // Direct trigger right after the workflow is created:
//! let workflow = engine.run_step(workflow_id, None).await?;
//! println!("workflow is now {}", workflow.workflow_state);
//! # Ok(())
//! # }
//! ```
//!
//! Webhook deliveries reduce to the same call:
//!
//! ```rust
//! use tenon::webhook::WebhookEvent;
//! use serde_json::json;
//!
//! let event = WebhookEvent::from_parts(
//!     "connections",
//!     json!({"connection_id": "conn-123", "state": "active"}),
//! );
//! assert_eq!(event.topic(), "connections");
//! ```
//!
//! ## Module Guide
//!
//! - [`models`] - Entity types and state enums
//! - [`webhook`] - Webhook event decoding
//! - [`engine`] - The onboarding workflow engine
//! - [`agent`] - Agent capability trait, ACA-Py adapter, bootstrap registrar
//! - [`store`] - Record-store traits and backends
//! - [`config`] - Environment-driven configuration
//! - [`telemetry`] - Tracing subscriber setup

pub mod agent;
pub mod config;
pub mod engine;
pub mod models;
pub mod store;
pub mod telemetry;
pub mod webhook;
