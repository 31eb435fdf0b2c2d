use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use veritrail_application::{AssessmentRecord, AssessmentRepository, AuditEvent};
use veritrail_core::{AppError, AppResult, TenantId};
use veritrail_domain::{AssessmentAssignmentSpec, WorkflowStage};

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for assessment assignment persistence.
///
/// Every mutation and its audit row commit in one transaction.
#[derive(Clone)]
pub struct PostgresAssessmentRepository {
    pool: PgPool,
}

impl PostgresAssessmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ASSESSMENT_COLUMNS: &str = r#"
    id,
    questionnaire_key,
    target,
    target_id,
    assignee_subject,
    to_char(due_date, 'YYYY-MM-DD') AS due_date,
    workflow_stage,
    responses,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

#[derive(Debug, FromRow)]
struct AssessmentRow {
    id: Uuid,
    questionnaire_key: String,
    target: String,
    target_id: String,
    assignee_subject: String,
    due_date: Option<String>,
    workflow_stage: String,
    responses: Option<Value>,
    created_at: String,
    updated_at: String,
}

impl From<AssessmentRow> for AssessmentRecord {
    fn from(row: AssessmentRow) -> Self {
        Self {
            assessment_id: row.id.to_string(),
            questionnaire_key: row.questionnaire_key,
            target: row.target,
            target_id: row.target_id,
            assignee_subject: row.assignee_subject,
            due_date: row.due_date,
            workflow_stage: row.workflow_stage,
            responses: row.responses,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AssessmentRepository for PostgresAssessmentRepository {
    async fn list_assessments(&self, tenant_id: TenantId) -> AppResult<Vec<AssessmentRecord>> {
        let rows = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            SELECT {ASSESSMENT_COLUMNS}
            FROM assessment_assignments
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assessments: {error}")))?;

        Ok(rows.into_iter().map(AssessmentRecord::from).collect())
    }

    async fn find_assessment(
        &self,
        tenant_id: TenantId,
        assessment_id: &str,
    ) -> AppResult<Option<AssessmentRecord>> {
        let Ok(assessment_uuid) = Uuid::parse_str(assessment_id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            SELECT {ASSESSMENT_COLUMNS}
            FROM assessment_assignments
            WHERE tenant_id = $1
                AND id = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(assessment_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load assessment: {error}")))?;

        Ok(row.map(AssessmentRecord::from))
    }

    async fn create_assessment(
        &self,
        tenant_id: TenantId,
        spec: AssessmentAssignmentSpec,
        audit: AuditEvent,
    ) -> AppResult<AssessmentRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            INSERT INTO assessment_assignments (
                tenant_id,
                questionnaire_key,
                target,
                target_id,
                assignee_subject,
                due_date
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ASSESSMENT_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(spec.questionnaire_key().as_str())
        .bind(spec.target().as_str())
        .bind(spec.target_id())
        .bind(spec.assignee_subject().as_str())
        .bind(spec.due_date())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create assessment: {error}")))?;

        insert_audit_event(
            &mut *tx,
            tenant_id,
            &audit,
            "assessment_assignment",
            &row.id.to_string(),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit assessment: {error}")))?;

        Ok(AssessmentRecord::from(row))
    }

    async fn save_responses(
        &self,
        tenant_id: TenantId,
        assessment_id: &str,
        responses: Value,
        audit: AuditEvent,
    ) -> AppResult<AssessmentRecord> {
        let assessment_uuid = Uuid::parse_str(assessment_id)
            .map_err(|_| AppError::NotFound(format!("assessment '{assessment_id}' not found")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            UPDATE assessment_assignments
            SET responses = $3,
                workflow_stage = 'submitted',
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
            RETURNING {ASSESSMENT_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(assessment_uuid)
        .bind(responses)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save responses: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("assessment '{assessment_id}' not found")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "assessment_assignment", assessment_id)
            .await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit assessment: {error}")))?;

        Ok(AssessmentRecord::from(row))
    }

    async fn set_assessment_stage(
        &self,
        tenant_id: TenantId,
        assessment_id: &str,
        stage: &WorkflowStage,
        audit: AuditEvent,
    ) -> AppResult<AssessmentRecord> {
        let assessment_uuid = Uuid::parse_str(assessment_id)
            .map_err(|_| AppError::NotFound(format!("assessment '{assessment_id}' not found")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            UPDATE assessment_assignments
            SET workflow_stage = $3,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
            RETURNING {ASSESSMENT_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(assessment_uuid)
        .bind(stage.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to set assessment stage: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("assessment '{assessment_id}' not found")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "assessment_assignment", assessment_id)
            .await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit assessment: {error}")))?;

        Ok(AssessmentRecord::from(row))
    }
}
