use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use veritrail_application::{AuditEvent, MessageRecord, MessageRepository, PostMessageInput};
use veritrail_core::{AppError, AppResult, TenantId};
use veritrail_domain::ResourceKind;

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for resource-attached message threads.
///
/// Every insert and its audit row commit in one transaction.
#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MESSAGE_COLUMNS: &str = r#"
    id,
    resource_kind,
    resource_id,
    parent_id,
    author_subject,
    body,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
"#;

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    resource_kind: String,
    resource_id: String,
    parent_id: Option<Uuid>,
    author_subject: String,
    body: String,
    created_at: String,
}

impl From<MessageRow> for MessageRecord {
    fn from(row: MessageRow) -> Self {
        Self {
            message_id: row.id.to_string(),
            resource_kind: row.resource_kind,
            resource_id: row.resource_id,
            parent_id: row.parent_id.map(|parent| parent.to_string()),
            author_subject: row.author_subject,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn list_thread(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: &str,
    ) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND resource_id = $3
            ORDER BY created_at, id
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(resource_kind.as_str())
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list message thread: {error}")))?;

        Ok(rows.into_iter().map(MessageRecord::from).collect())
    }

    async fn find_message(
        &self,
        tenant_id: TenantId,
        message_id: &str,
    ) -> AppResult<Option<MessageRecord>> {
        let Ok(message_uuid) = Uuid::parse_str(message_id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE tenant_id = $1
                AND id = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(message_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load message: {error}")))?;

        Ok(row.map(MessageRecord::from))
    }

    async fn create_message(
        &self,
        tenant_id: TenantId,
        input: PostMessageInput,
        author_subject: &str,
        audit: AuditEvent,
    ) -> AppResult<MessageRecord> {
        let parent_uuid = input
            .parent_id
            .as_deref()
            .map(|parent_id| {
                Uuid::parse_str(parent_id).map_err(|_| {
                    AppError::NotFound(format!("parent message '{parent_id}' not found"))
                })
            })
            .transpose()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            INSERT INTO messages (
                tenant_id,
                resource_kind,
                resource_id,
                parent_id,
                author_subject,
                body
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(input.resource_kind.as_str())
        .bind(&input.resource_id)
        .bind(parent_uuid)
        .bind(author_subject)
        .bind(input.body.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create message: {error}")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "message", &row.id.to_string()).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit message: {error}")))?;

        Ok(MessageRecord::from(row))
    }
}
