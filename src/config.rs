//! Environment-driven configuration, resolved once at process start.
//!
//! Variable names follow the deployment environment of the surrounding
//! platform (`ENDORSER_CONNECTION_ALIAS`, `ACAPY_*`). A `.env` file is
//! honored via `dotenvy` when present.

use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    #[diagnostic(
        code(tenon::config::missing_var),
        help("Set the variable in the process environment or a .env file.")
    )]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    #[diagnostic(code(tenon::config::invalid_var))]
    InvalidVar { var: &'static str, value: String },
}

/// Endorser identity and ledger endpoints consumed by the engine.
#[derive(Clone, Debug)]
pub struct OnboardingConfig {
    /// Display alias attached to the endorser connection.
    pub endorser_alias: String,
    /// Public DID of the designated endorser.
    pub endorser_public_did: String,
    /// Genesis-transactions URL of the ledger; the bootstrap registration
    /// endpoint is derived from it.
    pub genesis_url: String,
}

impl OnboardingConfig {
    #[must_use]
    pub fn new(
        endorser_alias: impl Into<String>,
        endorser_public_did: impl Into<String>,
        genesis_url: impl Into<String>,
    ) -> Self {
        Self {
            endorser_alias: endorser_alias.into(),
            endorser_public_did: endorser_public_did.into(),
            genesis_url: genesis_url.into(),
        }
    }

    /// Resolve from `ENDORSER_CONNECTION_ALIAS`, `ACAPY_ENDORSER_PUBLIC_DID`
    /// and `ACAPY_GENESIS_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(Self {
            endorser_alias: require("ENDORSER_CONNECTION_ALIAS")?,
            endorser_public_did: require("ACAPY_ENDORSER_PUBLIC_DID")?,
            genesis_url: require("ACAPY_GENESIS_URL")?,
        })
    }
}

/// Connection settings for the ACA-Py admin API.
#[derive(Clone, Debug)]
pub struct AcapySettings {
    /// Base URL of the agent admin endpoint.
    pub admin_url: String,
    /// Admin API key, sent as `x-api-key` when configured.
    pub admin_api_key: Option<String>,
    /// Per-request timeout. The engine imposes none of its own; every agent
    /// call must be bounded here.
    pub timeout: Duration,
}

impl AcapySettings {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn new(admin_url: impl Into<String>) -> Self {
        Self {
            admin_url: admin_url.into(),
            admin_api_key: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.admin_api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve from `ACAPY_ADMIN_URL`, `ACAPY_ADMIN_URL_API_KEY` (optional)
    /// and `ACAPY_CLIENT_TIMEOUT_SECS` (optional, default 30).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let timeout = match std::env::var("ACAPY_CLIENT_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidVar {
                        var: "ACAPY_CLIENT_TIMEOUT_SECS",
                        value: raw.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            Err(_) => Self::DEFAULT_TIMEOUT,
        };
        Ok(Self {
            admin_url: require("ACAPY_ADMIN_URL")?,
            admin_api_key: std::env::var("ACAPY_ADMIN_URL_API_KEY").ok(),
            timeout,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}
