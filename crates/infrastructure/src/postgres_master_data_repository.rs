use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use veritrail_application::{AuditEvent, MasterDataRepository};
use veritrail_core::{AppError, AppResult, TenantId};
use veritrail_domain::{
    MasterDataList, MasterDataListInput, MasterDataValue, MasterDataValueInput, SelectionMode,
};

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for master data list persistence.
///
/// Saving replaces a list's value set wholesale inside one transaction so
/// readers never observe a half-written list. The audit row commits in the
/// same transaction as the mutation it describes.
#[derive(Clone)]
pub struct PostgresMasterDataRepository {
    pool: PgPool,
}

impl PostgresMasterDataRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ListRow {
    id: Uuid,
    name: String,
    display_name: String,
    selection_mode: String,
}

#[derive(Debug, FromRow)]
struct ValueRow {
    list_id: Uuid,
    value: String,
    label: String,
    sort_order: i32,
    active: bool,
}

fn build_list(list: &ListRow, values: Vec<&ValueRow>) -> AppResult<MasterDataList> {
    let selection_mode: SelectionMode = list.selection_mode.parse().map_err(|error| {
        AppError::Internal(format!(
            "failed to decode selection mode for list '{}': {error}",
            list.name
        ))
    })?;

    MasterDataList::new(MasterDataListInput {
        name: list.name.clone(),
        display_name: list.display_name.clone(),
        selection_mode,
        values: values
            .into_iter()
            .map(|row| MasterDataValueInput {
                value: row.value.clone(),
                label: row.label.clone(),
                sort_order: row.sort_order,
                active: row.active,
            })
            .collect(),
    })
    .map_err(|error| {
        AppError::Internal(format!(
            "stored master data list '{}' failed validation: {error}",
            list.name
        ))
    })
}

#[async_trait]
impl MasterDataRepository for PostgresMasterDataRepository {
    async fn list_lists(&self, tenant_id: TenantId) -> AppResult<Vec<MasterDataList>> {
        let lists = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT id, name, display_name, selection_mode
            FROM master_data_lists
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list master data lists: {error}"))
        })?;

        let values = sqlx::query_as::<_, ValueRow>(
            r#"
            SELECT
                master_data_values.list_id,
                master_data_values.value,
                master_data_values.label,
                master_data_values.sort_order,
                master_data_values.active
            FROM master_data_values
            INNER JOIN master_data_lists
                ON master_data_lists.id = master_data_values.list_id
            WHERE master_data_lists.tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list master data values: {error}"))
        })?;

        lists
            .iter()
            .map(|list| {
                let members = values.iter().filter(|row| row.list_id == list.id).collect();
                build_list(list, members)
            })
            .collect()
    }

    async fn find_list(
        &self,
        tenant_id: TenantId,
        list_name: &str,
    ) -> AppResult<Option<MasterDataList>> {
        let list = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT id, name, display_name, selection_mode
            FROM master_data_lists
            WHERE tenant_id = $1
                AND name = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(list_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load master data list: {error}"))
        })?;

        let Some(list) = list else {
            return Ok(None);
        };

        let values = sqlx::query_as::<_, ValueRow>(
            r#"
            SELECT list_id, value, label, sort_order, active
            FROM master_data_values
            WHERE list_id = $1
            "#,
        )
        .bind(list.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load master data values: {error}"))
        })?;

        build_list(&list, values.iter().collect()).map(Some)
    }

    async fn save_list(
        &self,
        tenant_id: TenantId,
        list: MasterDataList,
        audit: AuditEvent,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let (list_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO master_data_lists (tenant_id, name, display_name, selection_mode)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, name)
            DO UPDATE SET display_name = EXCLUDED.display_name,
                selection_mode = EXCLUDED.selection_mode,
                updated_at = now()
            RETURNING id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(list.name())
        .bind(list.display_name().as_str())
        .bind(list.selection_mode().as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to save master data list: {error}"))
        })?;

        sqlx::query("DELETE FROM master_data_values WHERE list_id = $1")
            .bind(list_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear master data values: {error}"))
            })?;

        for member in list.values() {
            sqlx::query(
                r#"
                INSERT INTO master_data_values (list_id, value, label, sort_order, active)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(list_id)
            .bind(member.value())
            .bind(member.label().as_str())
            .bind(member.sort_order())
            .bind(member.active())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to save master data value: {error}"))
            })?;
        }

        insert_audit_event(
            &mut *transaction,
            tenant_id,
            &audit,
            "master_data_list",
            list.name(),
        )
        .await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit master data save: {error}"))
        })
    }

    async fn delete_list(
        &self,
        tenant_id: TenantId,
        list_name: &str,
        audit: AuditEvent,
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to open transaction: {error}")))?;

        let result = sqlx::query(
            r#"
            DELETE FROM master_data_lists
            WHERE tenant_id = $1
                AND name = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(list_name)
        .execute(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete master data list: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "master data list '{list_name}' not found"
            )));
        }

        insert_audit_event(&mut *tx, tenant_id, &audit, "master_data_list", list_name).await?;

        tx.commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit master data delete: {error}")))?;

        Ok(())
    }
}
