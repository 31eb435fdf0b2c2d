use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use veritrail_application::{AuthorizationRepository, DataFilterSourceRepository, RoleGrant};
use veritrail_core::{AppError, AppResult, TenantId, UserRole};
use veritrail_domain::{BusinessRuleCondition, BusinessRuleOperator, DataFilterRule, Permission};

/// PostgreSQL-backed repository for role-permission matrix lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    permission_key: String,
    allowed: bool,
    data_filter: Option<Value>,
    tenant_scoped: bool,
}

impl RoleGrantRow {
    fn into_grant(self, tenant_id: TenantId) -> AppResult<RoleGrant> {
        let permission = Permission::from_str(self.permission_key.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode permission '{}' for tenant '{tenant_id}': {error}",
                self.permission_key
            ))
        })?;

        let data_filter = self
            .data_filter
            .map(serde_json::from_value::<DataFilterRule>)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode data filter for permission '{}': {error}",
                    self.permission_key
                ))
            })?;

        Ok(RoleGrant {
            permission,
            allowed: self.allowed,
            data_filter,
            tenant_scoped: self.tenant_scoped,
        })
    }
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_role_grants(
        &self,
        tenant_id: TenantId,
        role: UserRole,
    ) -> AppResult<Vec<RoleGrant>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT
                permission_key,
                allowed,
                data_filter,
                (tenant_id IS NOT NULL) AS tenant_scoped
            FROM role_permissions
            WHERE role = $2
                AND (tenant_id = $1 OR tenant_id IS NULL)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role grants: {error}")))?;

        rows.into_iter()
            .map(|row| row.into_grant(tenant_id))
            .collect()
    }
}

/// PostgreSQL-backed repository resolving data filter references.
#[derive(Clone)]
pub struct PostgresDataFilterSourceRepository {
    pool: PgPool,
}

impl PostgresDataFilterSourceRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ListValueRow {
    value: String,
}

#[derive(Debug, FromRow)]
struct BusinessRuleRow {
    field: String,
    operator: String,
    value: Value,
}

#[async_trait]
impl DataFilterSourceRepository for PostgresDataFilterSourceRepository {
    async fn list_active_list_values(
        &self,
        tenant_id: TenantId,
        list_name: &str,
    ) -> AppResult<Vec<Value>> {
        let rows = sqlx::query_as::<_, ListValueRow>(
            r#"
            SELECT list_values.value
            FROM master_data_values AS list_values
            INNER JOIN master_data_lists AS lists
                ON lists.id = list_values.list_id
            WHERE lists.tenant_id = $1
                AND lists.name = $2
                AND list_values.active
            ORDER BY list_values.sort_order
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(list_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load master data values: {error}"))
        })?;

        Ok(rows.into_iter().map(|row| Value::String(row.value)).collect())
    }

    async fn find_business_rule_condition(
        &self,
        tenant_id: TenantId,
        rule_key: &str,
    ) -> AppResult<Option<BusinessRuleCondition>> {
        let row = sqlx::query_as::<_, BusinessRuleRow>(
            r#"
            SELECT field, operator, value
            FROM business_rules
            WHERE tenant_id = $1
                AND rule_key = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(rule_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load business rule: {error}")))?;

        row.map(|row| {
            let operator =
                BusinessRuleOperator::from_str(row.operator.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode business rule '{rule_key}': {error}"
                    ))
                })?;
            Ok(BusinessRuleCondition {
                field: row.field,
                operator,
                value: row.value,
            })
        })
        .transpose()
    }
}
