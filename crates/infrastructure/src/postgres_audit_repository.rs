use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};

use veritrail_application::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository};
use veritrail_core::{AppError, AppResult, TenantId};

/// Writes one audit row on the caller's connection.
///
/// Repository mutations call this inside their own transaction so the audit
/// row commits or rolls back together with the mutated row. The repository
/// supplies the resource type and identifier, which for inserts exist only
/// after the row does.
pub(crate) async fn insert_audit_event(
    connection: &mut PgConnection,
    tenant_id: TenantId,
    event: &AuditEvent,
    resource_type: &str,
    resource_id: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log_entries (
            tenant_id,
            subject,
            action,
            resource_type,
            resource_id,
            detail
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(&event.subject)
    .bind(event.action.as_str())
    .bind(resource_type)
    .bind(resource_id)
    .bind(event.detail.as_deref())
    .execute(connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

    Ok(())
}

/// PostgreSQL-backed repository for audit log read models.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    event_id: uuid::Uuid,
    subject: String,
    action: String,
    resource_type: String,
    resource_id: String,
    detail: Option<String>,
    created_at: String,
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_recent_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = query.limit.clamp(1, 200) as i64;
        let capped_offset = query.offset.min(5_000) as i64;
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id AS event_id,
                subject,
                action,
                resource_type,
                resource_id,
                detail,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM audit_log_entries
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR action = $2)
                AND ($3::TEXT IS NULL OR subject = $3)
            ORDER BY created_at DESC
            LIMIT $4
            OFFSET $5
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(query.action)
        .bind(query.subject)
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log entries: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| AuditLogEntry {
                event_id: row.event_id.to_string(),
                subject: row.subject,
                action: row.action,
                resource_type: row.resource_type,
                resource_id: row.resource_id,
                detail: row.detail,
                created_at: row.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use veritrail_application::{AuditEvent, AuditLogQuery, AuditLogRepository};
    use veritrail_core::TenantId;
    use veritrail_domain::AuditAction;

    use super::{PostgresAuditLogRepository, insert_audit_event};

    async fn connect() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };
        let pool = PgPool::connect(&database_url)
            .await
            .unwrap_or_else(|_| panic!("test database unavailable"));
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .unwrap_or_else(|_| panic!("test migrations failed"));
        Some(pool)
    }

    #[tokio::test]
    async fn inserted_events_are_listed_most_recent_first() {
        let Some(pool) = connect().await else {
            return;
        };

        let tenant_id = TenantId::new();
        sqlx::query("INSERT INTO tenants (id, slug, name, locale, timezone, license_tier) VALUES ($1, $2, $2, 'en-US', 'UTC', 'starter')")
            .bind(tenant_id.as_uuid())
            .bind(format!("audit-test-{tenant_id}"))
            .execute(&pool)
            .await
            .unwrap_or_else(|_| panic!("test tenant insert failed"));

        let event = AuditEvent {
            subject: "alice".to_owned(),
            action: AuditAction::VendorCreated,
            detail: None,
        };
        let mut connection = pool
            .acquire()
            .await
            .unwrap_or_else(|_| panic!("test connection failed"));
        for resource_id in ["v-1", "v-2"] {
            insert_audit_event(&mut *connection, tenant_id, &event, "vendor", resource_id)
                .await
                .unwrap_or_else(|_| panic!("test insert failed"));
        }
        drop(connection);

        let entries = PostgresAuditLogRepository::new(pool)
            .list_recent_entries(
                tenant_id,
                AuditLogQuery {
                    limit: 10,
                    offset: 0,
                    action: Some("vendor.created".to_owned()),
                    subject: None,
                },
            )
            .await
            .unwrap_or_else(|_| panic!("test list failed"));

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.subject == "alice"));
    }
}
