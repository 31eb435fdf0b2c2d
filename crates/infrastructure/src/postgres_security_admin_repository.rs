use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use veritrail_application::{
    AuditEvent, RolePermissionRecord, SaveRolePermissionInput, SecurityAdminRepository,
};
use veritrail_core::{AppError, AppResult, TenantId, UserRole};
use veritrail_domain::{DataFilterRule, Permission};

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for role-permission matrix administration.
///
/// Tenant overrides and platform defaults live in one table distinguished by
/// a nullable `tenant_id`. Administrative writes touch tenant rows only, and
/// each write commits with its audit row in one transaction.
#[derive(Clone)]
pub struct PostgresSecurityAdminRepository {
    pool: PgPool,
}

impl PostgresSecurityAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ROLE_PERMISSION_COLUMNS: &str = r#"
    role,
    permission_key,
    allowed,
    data_filter,
    (tenant_id IS NOT NULL) AS tenant_scoped,
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

#[derive(Debug, FromRow)]
struct RolePermissionRow {
    role: String,
    permission_key: String,
    allowed: bool,
    data_filter: Option<Value>,
    tenant_scoped: bool,
    updated_at: String,
}

impl RolePermissionRow {
    fn into_record(self) -> AppResult<RolePermissionRecord> {
        let role = UserRole::from_str(self.role.as_str()).map_err(|error| {
            AppError::Internal(format!("failed to decode role-permission row: {error}"))
        })?;
        let permission = Permission::from_str(self.permission_key.as_str()).map_err(|error| {
            AppError::Internal(format!("failed to decode role-permission row: {error}"))
        })?;
        let data_filter = self
            .data_filter
            .map(serde_json::from_value::<DataFilterRule>)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode data filter for '{}': {error}",
                    self.permission_key
                ))
            })?;

        Ok(RolePermissionRecord {
            role,
            permission,
            allowed: self.allowed,
            data_filter,
            tenant_scoped: self.tenant_scoped,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl SecurityAdminRepository for PostgresSecurityAdminRepository {
    async fn list_role_permissions(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<RolePermissionRecord>> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(&format!(
            r#"
            SELECT {ROLE_PERMISSION_COLUMNS}
            FROM role_permissions
            WHERE tenant_id = $1
                OR tenant_id IS NULL
            ORDER BY role, permission_key, tenant_id NULLS LAST
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role permissions: {error}"))
        })?;

        rows.into_iter().map(RolePermissionRow::into_record).collect()
    }

    async fn save_role_permission(
        &self,
        tenant_id: TenantId,
        input: SaveRolePermissionInput,
        audit: AuditEvent,
    ) -> AppResult<RolePermissionRecord> {
        let data_filter = input
            .data_filter
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!("failed to encode data filter: {error}"))
            })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let row = sqlx::query_as::<_, RolePermissionRow>(&format!(
            r#"
            INSERT INTO role_permissions (tenant_id, role, category, permission_key, allowed, data_filter)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id, role, permission_key)
            DO UPDATE SET allowed = EXCLUDED.allowed,
                data_filter = EXCLUDED.data_filter,
                category = EXCLUDED.category,
                updated_at = now()
            RETURNING {ROLE_PERMISSION_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(input.role.as_str())
        .bind(input.permission.category().as_str())
        .bind(input.permission.as_str())
        .bind(input.allowed)
        .bind(data_filter)
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to save role permission: {error}"))
        })?;

        insert_audit_event(
            &mut *tx,
            tenant_id,
            &audit,
            "role_permission",
            &format!("{}:{}", input.role.as_str(), input.permission.as_str()),
        )
        .await?;

        tx.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit role permission: {error}"))
        })?;

        row.into_record()
    }

    async fn remove_role_permission(
        &self,
        tenant_id: TenantId,
        role: UserRole,
        permission: Permission,
        audit: AuditEvent,
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let result = sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE tenant_id = $1
                AND role = $2
                AND permission_key = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.as_str())
        .bind(permission.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove role permission: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "no tenant override of '{}' for role '{}'",
                permission.as_str(),
                role.as_str()
            )));
        }

        insert_audit_event(
            &mut *tx,
            tenant_id,
            &audit,
            "role_permission",
            &format!("{}:{}", role.as_str(), permission.as_str()),
        )
        .await?;

        tx.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit role permission: {error}"))
        })?;

        Ok(())
    }
}
