//! SQLite-backed record stores.
//!
//! Uuids and state enums are stored as TEXT and mapped back through their
//! `FromStr` forms; timestamps ride sqlx's chrono support. Embedded
//! migrations (`migrations/`) run on [`connect`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use super::{
    IssuerUpdate, Result, StoreError, TenantIssuerStore, TenantWorkflowStore, WorkflowUpdate,
};
use crate::models::{TenantIssuer, TenantWorkflow};

/// Open a pool against `database_url` and run embedded migrations.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePool::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

fn parse_uuid(column: &'static str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|_| StoreError::InvalidColumn {
        column,
        value: value.to_string(),
    })
}

fn workflow_from_row(row: &SqliteRow) -> Result<TenantWorkflow> {
    let id: String = row.try_get("id")?;
    let wallet_id: String = row.try_get("wallet_id")?;
    let state: String = row.try_get("workflow_state")?;
    Ok(TenantWorkflow {
        id: parse_uuid("id", &id)?,
        wallet_id: parse_uuid("wallet_id", &wallet_id)?,
        workflow_state: state.parse()?,
        wallet_bearer_token: row.try_get("wallet_bearer_token")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn issuer_from_row(row: &SqliteRow) -> Result<TenantIssuer> {
    let id: String = row.try_get("id")?;
    let tenant_id: String = row.try_get("tenant_id")?;
    let wallet_id: String = row.try_get("wallet_id")?;
    let workflow_id: Option<String> = row.try_get("workflow_id")?;
    let connection_state: Option<String> = row.try_get("endorser_connection_state")?;
    let did_state: Option<String> = row.try_get("public_did_state")?;
    Ok(TenantIssuer {
        id: parse_uuid("id", &id)?,
        tenant_id: parse_uuid("tenant_id", &tenant_id)?,
        wallet_id: parse_uuid("wallet_id", &wallet_id)?,
        workflow_id: workflow_id
            .as_deref()
            .map(|v| parse_uuid("workflow_id", v))
            .transpose()?,
        endorser_connection_id: row.try_get("endorser_connection_id")?,
        endorser_connection_state: connection_state
            .as_deref()
            .map(|v| v.parse::<crate::models::ConnectionState>())
            .transpose()
            .map_err(StoreError::Corrupt)?,
        public_did: row.try_get("public_did")?,
        public_did_state: did_state
            .as_deref()
            .map(|v| v.parse::<crate::models::PublicDidState>())
            .transpose()
            .map_err(StoreError::Corrupt)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

/// SQLite [`TenantWorkflowStore`].
#[derive(Clone)]
pub struct SqliteWorkflowStore {
    pool: SqlitePool,
}

impl SqliteWorkflowStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Seed a record. Creation happens outside the engine (tenant
    /// provisioning); this is that path.
    #[instrument(skip(self, workflow), fields(id = %workflow.id), err)]
    pub async fn insert(&self, workflow: &TenantWorkflow) -> Result<()> {
        sqlx::query(
            "INSERT INTO tenant_workflows \
             (id, wallet_id, workflow_state, wallet_bearer_token, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(workflow.id.to_string())
        .bind(workflow.wallet_id.to_string())
        .bind(workflow.workflow_state.as_str())
        .bind(&workflow.wallet_bearer_token)
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TenantWorkflowStore for SqliteWorkflowStore {
    async fn get(&self, id: Uuid) -> Result<TenantWorkflow> {
        let row = sqlx::query("SELECT * FROM tenant_workflows WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "tenant workflow",
                id: id.to_string(),
            })?;
        workflow_from_row(&row)
    }

    async fn update(&self, patch: WorkflowUpdate) -> Result<TenantWorkflow> {
        let result = sqlx::query(
            "UPDATE tenant_workflows \
             SET workflow_state = ?1, wallet_bearer_token = ?2, updated_at = ?3 \
             WHERE id = ?4",
        )
        .bind(patch.workflow_state.as_str())
        .bind(&patch.wallet_bearer_token)
        .bind(Utc::now())
        .bind(patch.id.to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "tenant workflow",
                id: patch.id.to_string(),
            });
        }
        self.get(patch.id).await
    }
}

/// SQLite [`TenantIssuerStore`].
#[derive(Clone)]
pub struct SqliteIssuerStore {
    pool: SqlitePool,
}

impl SqliteIssuerStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Seed a record. See [`SqliteWorkflowStore::insert`].
    #[instrument(skip(self, issuer), fields(id = %issuer.id), err)]
    pub async fn insert(&self, issuer: &TenantIssuer) -> Result<()> {
        sqlx::query(
            "INSERT INTO tenant_issuers \
             (id, tenant_id, wallet_id, workflow_id, endorser_connection_id, \
              endorser_connection_state, public_did, public_did_state, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(issuer.id.to_string())
        .bind(issuer.tenant_id.to_string())
        .bind(issuer.wallet_id.to_string())
        .bind(issuer.workflow_id.map(|id| id.to_string()))
        .bind(&issuer.endorser_connection_id)
        .bind(issuer.endorser_connection_state.map(|s| s.as_str()))
        .bind(&issuer.public_did)
        .bind(issuer.public_did_state.map(|s| s.as_str()))
        .bind(issuer.created_at)
        .bind(issuer.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<TenantIssuer> {
        let row = sqlx::query("SELECT * FROM tenant_issuers WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "tenant issuer",
                id: id.to_string(),
            })?;
        issuer_from_row(&row)
    }
}

#[async_trait]
impl TenantIssuerStore for SqliteIssuerStore {
    async fn get_by_wallet_id(&self, wallet_id: Uuid) -> Result<TenantIssuer> {
        let row = sqlx::query("SELECT * FROM tenant_issuers WHERE wallet_id = ?1")
            .bind(wallet_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "tenant issuer",
                id: wallet_id.to_string(),
            })?;
        issuer_from_row(&row)
    }

    async fn update(&self, patch: IssuerUpdate) -> Result<TenantIssuer> {
        let result = sqlx::query(
            "UPDATE tenant_issuers \
             SET workflow_id = ?1, endorser_connection_id = ?2, \
                 endorser_connection_state = ?3, public_did = ?4, \
                 public_did_state = ?5, updated_at = ?6 \
             WHERE id = ?7",
        )
        .bind(patch.workflow_id.map(|id| id.to_string()))
        .bind(&patch.endorser_connection_id)
        .bind(patch.endorser_connection_state.map(|s| s.as_str()))
        .bind(&patch.public_did)
        .bind(patch.public_did_state.map(|s| s.as_str()))
        .bind(Utc::now())
        .bind(patch.id.to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "tenant issuer",
                id: patch.id.to_string(),
            });
        }
        self.get(patch.id).await
    }
}
