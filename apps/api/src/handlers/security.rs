use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use veritrail_core::{UserIdentity, UserRole};
use veritrail_domain::Permission;

use crate::dto::{
    AuditLogEntryResponse, RemoveRolePermissionRequest, RolePermissionResponse,
    SaveRolePermissionRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Query parameters accepted by the audit log listing.
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    /// Maximum rows returned.
    pub limit: Option<usize>,
    /// Rows skipped for offset pagination.
    pub offset: Option<usize>,
    /// Optional action filter.
    pub action: Option<String>,
    /// Optional subject filter.
    pub subject: Option<String>,
}

/// Lists the effective role-permission matrix.
pub async fn list_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RolePermissionResponse>>> {
    let rows = state
        .security_admin_service
        .list_role_permissions(&user)
        .await?
        .into_iter()
        .map(RolePermissionResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(rows))
}

/// Saves a tenant role-permission override.
pub async fn save_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<SaveRolePermissionRequest>,
) -> ApiResult<Json<RolePermissionResponse>> {
    let row = state
        .security_admin_service
        .save_role_permission(&user, request.into_input()?)
        .await?;

    Ok(Json(RolePermissionResponse::try_from(row)?))
}

/// Removes a tenant role-permission override.
pub async fn remove_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<RemoveRolePermissionRequest>,
) -> ApiResult<StatusCode> {
    let role = UserRole::from_str(request.role.as_str())?;
    let permission = Permission::from_str(request.permission.as_str())?;

    state
        .security_admin_service
        .remove_role_permission(&user, role, permission)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists recent audit log entries.
pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let entries = state
        .security_admin_service
        .list_audit_log(
            &user,
            veritrail_application::AuditLogQuery {
                limit: query.limit.unwrap_or(50),
                offset: query.offset.unwrap_or(0),
                action: query.action,
                subject: query.subject,
            },
        )
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
