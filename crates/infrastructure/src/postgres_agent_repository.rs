use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use veritrail_application::{AgentRecord, AgentRepository, AuditEvent};
use veritrail_core::{AppError, AppResult, TenantId};
use veritrail_domain::{AgentProfile, WorkflowStage};

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for AI agent persistence.
///
/// Every mutation and its audit row commit in one transaction.
#[derive(Clone)]
pub struct PostgresAgentRepository {
    pool: PgPool,
}

impl PostgresAgentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const AGENT_COLUMNS: &str = r#"
    id,
    name,
    provider,
    model,
    capabilities,
    risk_tier,
    owner_subject,
    workflow_stage,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

#[derive(Debug, FromRow)]
struct AgentRow {
    id: Uuid,
    name: String,
    provider: String,
    model: Option<String>,
    capabilities: Value,
    risk_tier: String,
    owner_subject: String,
    workflow_stage: String,
    created_at: String,
    updated_at: String,
}

impl AgentRow {
    fn into_record(self) -> AppResult<AgentRecord> {
        let capabilities: Vec<String> =
            serde_json::from_value(self.capabilities).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode capabilities for agent '{}': {error}",
                    self.id
                ))
            })?;

        Ok(AgentRecord {
            agent_id: self.id.to_string(),
            name: self.name,
            provider: self.provider,
            model: self.model,
            capabilities,
            risk_tier: self.risk_tier,
            owner_subject: self.owner_subject,
            workflow_stage: self.workflow_stage,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl AgentRepository for PostgresAgentRepository {
    async fn list_agents(&self, tenant_id: TenantId) -> AppResult<Vec<AgentRecord>> {
        let rows = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            SELECT {AGENT_COLUMNS}
            FROM agents
            WHERE tenant_id = $1
            ORDER BY name
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list agents: {error}")))?;

        rows.into_iter().map(AgentRow::into_record).collect()
    }

    async fn find_agent(
        &self,
        tenant_id: TenantId,
        agent_id: &str,
    ) -> AppResult<Option<AgentRecord>> {
        let Ok(agent_uuid) = Uuid::parse_str(agent_id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            SELECT {AGENT_COLUMNS}
            FROM agents
            WHERE tenant_id = $1
                AND id = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(agent_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load agent: {error}")))?;

        row.map(AgentRow::into_record).transpose()
    }

    async fn create_agent(
        &self,
        tenant_id: TenantId,
        profile: AgentProfile,
        audit: AuditEvent,
    ) -> AppResult<AgentRecord> {
        let capabilities = serde_json::to_value(profile.capabilities()).map_err(|error| {
            AppError::Internal(format!("failed to encode agent capabilities: {error}"))
        })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            INSERT INTO agents (
                tenant_id,
                name,
                provider,
                model,
                capabilities,
                risk_tier,
                owner_subject
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(profile.name().as_str())
        .bind(profile.provider().as_str())
        .bind(profile.model())
        .bind(capabilities)
        .bind(profile.risk_tier().as_str())
        .bind(profile.owner_subject().as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create agent: {error}")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "agent", &row.id.to_string()).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit agent: {error}")))?;

        row.into_record()
    }

    async fn update_agent(
        &self,
        tenant_id: TenantId,
        agent_id: &str,
        profile: AgentProfile,
        audit: AuditEvent,
    ) -> AppResult<AgentRecord> {
        let agent_uuid = Uuid::parse_str(agent_id)
            .map_err(|_| AppError::NotFound(format!("agent '{agent_id}' not found")))?;
        let capabilities = serde_json::to_value(profile.capabilities()).map_err(|error| {
            AppError::Internal(format!("failed to encode agent capabilities: {error}"))
        })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            UPDATE agents
            SET name = $3,
                provider = $4,
                model = $5,
                capabilities = $6,
                risk_tier = $7,
                owner_subject = $8,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(agent_uuid)
        .bind(profile.name().as_str())
        .bind(profile.provider().as_str())
        .bind(profile.model())
        .bind(capabilities)
        .bind(profile.risk_tier().as_str())
        .bind(profile.owner_subject().as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update agent: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("agent '{agent_id}' not found")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "agent", agent_id).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit agent: {error}")))?;

        row.into_record()
    }

    async fn set_agent_stage(
        &self,
        tenant_id: TenantId,
        agent_id: &str,
        stage: &WorkflowStage,
        audit: AuditEvent,
    ) -> AppResult<AgentRecord> {
        let agent_uuid = Uuid::parse_str(agent_id)
            .map_err(|_| AppError::NotFound(format!("agent '{agent_id}' not found")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            UPDATE agents
            SET workflow_stage = $3,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(agent_uuid)
        .bind(stage.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to set agent stage: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("agent '{agent_id}' not found")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "agent", agent_id).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit agent: {error}")))?;

        row.into_record()
    }

    async fn delete_agent(
        &self,
        tenant_id: TenantId,
        agent_id: &str,
        audit: AuditEvent,
    ) -> AppResult<()> {
        let agent_uuid = Uuid::parse_str(agent_id)
            .map_err(|_| AppError::NotFound(format!("agent '{agent_id}' not found")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let result = sqlx::query(
            r#"
            DELETE FROM agents
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(agent_uuid)
        .execute(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete agent: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("agent '{agent_id}' not found")));
        }

        insert_audit_event(&mut *tx, tenant_id, &audit, "agent", agent_id).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit agent: {error}")))?;

        Ok(())
    }
}
