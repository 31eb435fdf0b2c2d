use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use veritrail_application::IdentityRepository;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity, UserRole};

/// PostgreSQL-backed repository resolving API tokens to identities.
#[derive(Clone)]
pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IdentityRow {
    subject: String,
    display_name: String,
    email: Option<String>,
    role: String,
    tenant_id: Option<uuid::Uuid>,
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn find_identity_by_token_digest(
        &self,
        token_digest: &str,
    ) -> AppResult<Option<UserIdentity>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT
                users.subject,
                users.display_name,
                users.email,
                users.role,
                users.tenant_id
            FROM api_tokens
            INNER JOIN users
                ON users.id = api_tokens.user_id
            WHERE api_tokens.token_digest = $1
                AND api_tokens.revoked_at IS NULL
            "#,
        )
        .bind(token_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve API token: {error}")))?;

        row.map(|row| {
            let role = UserRole::from_str(row.role.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode role for subject '{}': {error}",
                    row.subject
                ))
            })?;
            UserIdentity::new(
                row.subject,
                row.display_name,
                row.email,
                role,
                row.tenant_id.map(TenantId::from_uuid),
            )
        })
        .transpose()
    }
}
