use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use veritrail_application::{AuditEvent, OnboardingRecord, OnboardingRepository};
use veritrail_core::{AppError, AppResult, TenantId};
use veritrail_domain::{OnboardingDecision, OnboardingRequestSpec};

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for onboarding request persistence.
///
/// Every mutation and its audit row commit in one transaction.
#[derive(Clone)]
pub struct PostgresOnboardingRepository {
    pool: PgPool,
}

impl PostgresOnboardingRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ONBOARDING_COLUMNS: &str = r#"
    id,
    kind,
    title,
    justification,
    payload,
    requested_by,
    workflow_stage,
    decided_by,
    decision_note,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

#[derive(Debug, FromRow)]
struct OnboardingRow {
    id: Uuid,
    kind: String,
    title: String,
    justification: String,
    payload: Value,
    requested_by: String,
    workflow_stage: String,
    decided_by: Option<String>,
    decision_note: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<OnboardingRow> for OnboardingRecord {
    fn from(row: OnboardingRow) -> Self {
        Self {
            request_id: row.id.to_string(),
            kind: row.kind,
            title: row.title,
            justification: row.justification,
            payload: row.payload,
            requested_by: row.requested_by,
            workflow_stage: row.workflow_stage,
            decided_by: row.decided_by,
            decision_note: row.decision_note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl OnboardingRepository for PostgresOnboardingRepository {
    async fn list_requests(&self, tenant_id: TenantId) -> AppResult<Vec<OnboardingRecord>> {
        let rows = sqlx::query_as::<_, OnboardingRow>(&format!(
            r#"
            SELECT {ONBOARDING_COLUMNS}
            FROM onboarding_requests
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list onboarding requests: {error}"))
        })?;

        Ok(rows.into_iter().map(OnboardingRecord::from).collect())
    }

    async fn find_request(
        &self,
        tenant_id: TenantId,
        request_id: &str,
    ) -> AppResult<Option<OnboardingRecord>> {
        let Ok(request_uuid) = Uuid::parse_str(request_id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, OnboardingRow>(&format!(
            r#"
            SELECT {ONBOARDING_COLUMNS}
            FROM onboarding_requests
            WHERE tenant_id = $1
                AND id = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(request_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load onboarding request: {error}"))
        })?;

        Ok(row.map(OnboardingRecord::from))
    }

    async fn create_request(
        &self,
        tenant_id: TenantId,
        spec: OnboardingRequestSpec,
        requested_by: &str,
        audit: AuditEvent,
    ) -> AppResult<OnboardingRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, OnboardingRow>(&format!(
            r#"
            INSERT INTO onboarding_requests (tenant_id, kind, title, justification, payload, requested_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ONBOARDING_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(spec.kind().as_str())
        .bind(spec.title().as_str())
        .bind(spec.justification().as_str())
        .bind(spec.payload())
        .bind(requested_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create onboarding request: {error}"))
        })?;

        insert_audit_event(
            &mut *tx,
            tenant_id,
            &audit,
            "onboarding_request",
            &row.id.to_string(),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit onboarding request: {error}")))?;

        Ok(OnboardingRecord::from(row))
    }

    async fn record_decision(
        &self,
        tenant_id: TenantId,
        request_id: &str,
        decision: OnboardingDecision,
        decided_by: &str,
        note: Option<String>,
        audit: AuditEvent,
    ) -> AppResult<OnboardingRecord> {
        let request_uuid = Uuid::parse_str(request_id).map_err(|_| {
            AppError::NotFound(format!("onboarding request '{request_id}' not found"))
        })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, OnboardingRow>(&format!(
            r#"
            UPDATE onboarding_requests
            SET workflow_stage = $3,
                decided_by = $4,
                decision_note = $5,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
            RETURNING {ONBOARDING_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(request_uuid)
        .bind(decision.as_stage())
        .bind(decided_by)
        .bind(note)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to record onboarding decision: {error}"))
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!("onboarding request '{request_id}' not found"))
        })?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "onboarding_request", request_id).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit onboarding request: {error}")))?;

        Ok(OnboardingRecord::from(row))
    }
}
