use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use veritrail_application::{AuditEvent, TenantRecord, TenantRepository};
use veritrail_core::{AppError, AppResult, TenantId};
use veritrail_domain::TenantProfile;

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for tenant persistence.
///
/// Every mutation and its audit row commit in one transaction; the audit row
/// is scoped to the mutated tenant itself.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TENANT_COLUMNS: &str = r#"
    id,
    slug,
    name,
    industry,
    locale,
    timezone,
    license_tier,
    feature_flags,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
"#;

#[derive(Debug, FromRow)]
struct TenantRow {
    id: uuid::Uuid,
    slug: String,
    name: String,
    industry: Option<String>,
    locale: String,
    timezone: String,
    license_tier: String,
    feature_flags: Value,
    created_at: String,
}

impl From<TenantRow> for TenantRecord {
    fn from(row: TenantRow) -> Self {
        Self {
            tenant_id: TenantId::from_uuid(row.id),
            slug: row.slug,
            name: row.name,
            industry: row.industry,
            locale: row.locale,
            timezone: row.timezone,
            license_tier: row.license_tier,
            feature_flags: flags_from_value(row.feature_flags),
            created_at: row.created_at,
        }
    }
}

fn flags_from_value(value: Value) -> BTreeMap<String, bool> {
    match value {
        Value::Object(entries) => entries
            .into_iter()
            .filter_map(|(name, flag)| flag.as_bool().map(|flag| (name, flag)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn flags_to_value(flags: &BTreeMap<String, bool>) -> Value {
    Value::Object(
        flags
            .iter()
            .map(|(name, flag)| (name.clone(), Value::Bool(*flag)))
            .collect(),
    )
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn list_tenants(&self) -> AppResult<Vec<TenantRecord>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants ORDER BY slug"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list tenants: {error}")))?;

        Ok(rows.into_iter().map(TenantRecord::from).collect())
    }

    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<TenantRecord>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"
        ))
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load tenant: {error}")))?;

        Ok(row.map(TenantRecord::from))
    }

    async fn create_tenant(
        &self,
        profile: TenantProfile,
        audit: AuditEvent,
    ) -> AppResult<TenantRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, TenantRow>(&format!(
            r#"
            INSERT INTO tenants (slug, name, industry, locale, timezone, license_tier, feature_flags)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TENANT_COLUMNS}
            "#
        ))
        .bind(profile.slug())
        .bind(profile.name().as_str())
        .bind(profile.industry())
        .bind(profile.locale())
        .bind(profile.timezone())
        .bind(profile.license_tier().as_str())
        .bind(flags_to_value(profile.feature_flags()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(database_error) if database_error.is_unique_violation() => {
                AppError::Conflict(format!("tenant slug '{}' already exists", profile.slug()))
            }
            other => AppError::Internal(format!("failed to create tenant: {other}")),
        })?;

        insert_audit_event(
            &mut *tx,
            TenantId::from_uuid(row.id),
            &audit,
            "tenant",
            &row.id.to_string(),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit tenant: {error}")))?;

        Ok(TenantRecord::from(row))
    }

    async fn update_tenant(
        &self,
        tenant_id: TenantId,
        profile: TenantProfile,
        audit: AuditEvent,
    ) -> AppResult<TenantRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, TenantRow>(&format!(
            r#"
            UPDATE tenants
            SET slug = $2,
                name = $3,
                industry = $4,
                locale = $5,
                timezone = $6,
                license_tier = $7,
                feature_flags = $8
            WHERE id = $1
            RETURNING {TENANT_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(profile.slug())
        .bind(profile.name().as_str())
        .bind(profile.industry())
        .bind(profile.locale())
        .bind(profile.timezone())
        .bind(profile.license_tier().as_str())
        .bind(flags_to_value(profile.feature_flags()))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update tenant: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))?;

        insert_audit_event(&mut *tx, tenant_id, &audit, "tenant", &row.id.to_string()).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit tenant: {error}")))?;

        Ok(TenantRecord::from(row))
    }
}
