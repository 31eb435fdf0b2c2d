use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use veritrail_application::{AuditEvent, VendorRecord, VendorRepository};
use veritrail_core::{AppError, AppResult, TenantId};
use veritrail_domain::{VendorProfile, WorkflowStage};

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for vendor persistence.
///
/// Deletes are soft: rows keep their audit history and are excluded from
/// listings through `deleted_at`. Every mutation and its audit row commit in
/// one transaction.
#[derive(Clone)]
pub struct PostgresVendorRepository {
    pool: PgPool,
}

impl PostgresVendorRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const VENDOR_COLUMNS: &str = r#"
    id,
    name,
    category,
    contact_email,
    risk_tier,
    workflow_stage,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

#[derive(Debug, FromRow)]
struct VendorRow {
    id: Uuid,
    name: String,
    category: Option<String>,
    contact_email: Option<String>,
    risk_tier: String,
    workflow_stage: String,
    created_at: String,
    updated_at: String,
}

impl From<VendorRow> for VendorRecord {
    fn from(row: VendorRow) -> Self {
        Self {
            vendor_id: row.id.to_string(),
            name: row.name,
            category: row.category,
            contact_email: row.contact_email,
            risk_tier: row.risk_tier,
            workflow_stage: row.workflow_stage,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl VendorRepository for PostgresVendorRepository {
    async fn list_vendors(&self, tenant_id: TenantId) -> AppResult<Vec<VendorRecord>> {
        let rows = sqlx::query_as::<_, VendorRow>(&format!(
            r#"
            SELECT {VENDOR_COLUMNS}
            FROM vendors
            WHERE tenant_id = $1
                AND deleted_at IS NULL
            ORDER BY name
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list vendors: {error}")))?;

        Ok(rows.into_iter().map(VendorRecord::from).collect())
    }

    async fn find_vendor(
        &self,
        tenant_id: TenantId,
        vendor_id: &str,
    ) -> AppResult<Option<VendorRecord>> {
        let Ok(vendor_uuid) = Uuid::parse_str(vendor_id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, VendorRow>(&format!(
            r#"
            SELECT {VENDOR_COLUMNS}
            FROM vendors
            WHERE tenant_id = $1
                AND id = $2
                AND deleted_at IS NULL
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(vendor_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load vendor: {error}")))?;

        Ok(row.map(VendorRecord::from))
    }

    async fn create_vendor(
        &self,
        tenant_id: TenantId,
        profile: VendorProfile,
        audit: AuditEvent,
    ) -> AppResult<VendorRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, VendorRow>(&format!(
            r#"
            INSERT INTO vendors (tenant_id, name, category, contact_email, risk_tier)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {VENDOR_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(profile.name().as_str())
        .bind(profile.category())
        .bind(profile.contact_email().map(|email| email.as_str()))
        .bind(profile.risk_tier().as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create vendor: {error}")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "vendor", &row.id.to_string()).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit vendor: {error}")))?;

        Ok(VendorRecord::from(row))
    }

    async fn update_vendor(
        &self,
        tenant_id: TenantId,
        vendor_id: &str,
        profile: VendorProfile,
        audit: AuditEvent,
    ) -> AppResult<VendorRecord> {
        let vendor_uuid = Uuid::parse_str(vendor_id)
            .map_err(|_| AppError::NotFound(format!("vendor '{vendor_id}' not found")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, VendorRow>(&format!(
            r#"
            UPDATE vendors
            SET name = $3,
                category = $4,
                contact_email = $5,
                risk_tier = $6,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
                AND deleted_at IS NULL
            RETURNING {VENDOR_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(vendor_uuid)
        .bind(profile.name().as_str())
        .bind(profile.category())
        .bind(profile.contact_email().map(|email| email.as_str()))
        .bind(profile.risk_tier().as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update vendor: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("vendor '{vendor_id}' not found")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "vendor", vendor_id).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit vendor: {error}")))?;

        Ok(VendorRecord::from(row))
    }

    async fn set_vendor_stage(
        &self,
        tenant_id: TenantId,
        vendor_id: &str,
        stage: &WorkflowStage,
        audit: AuditEvent,
    ) -> AppResult<VendorRecord> {
        let vendor_uuid = Uuid::parse_str(vendor_id)
            .map_err(|_| AppError::NotFound(format!("vendor '{vendor_id}' not found")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, VendorRow>(&format!(
            r#"
            UPDATE vendors
            SET workflow_stage = $3,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
                AND deleted_at IS NULL
            RETURNING {VENDOR_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(vendor_uuid)
        .bind(stage.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to set vendor stage: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("vendor '{vendor_id}' not found")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "vendor", vendor_id).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit vendor: {error}")))?;

        Ok(VendorRecord::from(row))
    }

    async fn soft_delete_vendor(
        &self,
        tenant_id: TenantId,
        vendor_id: &str,
        audit: AuditEvent,
    ) -> AppResult<()> {
        let vendor_uuid = Uuid::parse_str(vendor_id)
            .map_err(|_| AppError::NotFound(format!("vendor '{vendor_id}' not found")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let result = sqlx::query(
            r#"
            UPDATE vendors
            SET deleted_at = now(),
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
                AND deleted_at IS NULL
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(vendor_uuid)
        .execute(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete vendor: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("vendor '{vendor_id}' not found")));
        }

        insert_audit_event(&mut *tx, tenant_id, &audit, "vendor", vendor_id).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit vendor: {error}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use veritrail_application::{AuditEvent, VendorRepository};
    use veritrail_core::TenantId;
    use veritrail_domain::{AuditAction, RiskTier, VendorProfile, VendorProfileInput};

    use super::PostgresVendorRepository;

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

    async fn seed_tenant(pool: &PgPool) -> TenantId {
        let tenant_id = TenantId::new();
        sqlx::query("INSERT INTO tenants (id, slug, name, locale, timezone, license_tier) VALUES ($1, $2, $2, 'en-US', 'UTC', 'starter')")
            .bind(tenant_id.as_uuid())
            .bind(format!("vendor-test-{tenant_id}"))
            .execute(pool)
            .await
            .unwrap_or_else(|_| panic!("test tenant insert failed"));
        tenant_id
    }

    #[tokio::test]
    async fn create_vendor_commits_audit_row_with_vendor() {
        let Some(pool) = connect().await else {
            return;
        };
        let tenant_id = seed_tenant(&pool).await;

        let profile = VendorProfile::new(VendorProfileInput {
            name: "Sigma Cloud".to_owned(),
            category: Some("cloud".to_owned()),
            contact_email: None,
            risk_tier: RiskTier::Medium,
        })
        .unwrap_or_else(|_| panic!("test"));

        let vendor = PostgresVendorRepository::new(pool.clone())
            .create_vendor(
                tenant_id,
                profile,
                AuditEvent {
                    subject: "alice".to_owned(),
                    action: AuditAction::VendorCreated,
                    detail: None,
                },
            )
            .await
            .unwrap_or_else(|_| panic!("test create failed"));

        let (count,): (i64,) = sqlx::query_as(
            "SELECT count(*) FROM audit_log_entries WHERE tenant_id = $1 AND resource_id = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(&vendor.vendor_id)
        .fetch_one(&pool)
        .await
        .unwrap_or_else(|_| panic!("test count failed"));

        assert_eq!(count, 1);
    }
}
