use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use veritrail_core::UserIdentity;

use crate::dto::{MeResponse, SaveTenantRequest, TenantResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Returns the authenticated caller.
pub async fn me_handler(
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<MeResponse>> {
    Ok(Json(MeResponse::from(user)))
}

/// Lists tenants the caller administers.
pub async fn list_tenants_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<TenantResponse>>> {
    let tenants = state
        .tenant_service
        .list_tenants(&user)
        .await?
        .into_iter()
        .map(TenantResponse::from)
        .collect();

    Ok(Json(tenants))
}

/// Creates a tenant, platform scope only.
pub async fn create_tenant_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<SaveTenantRequest>,
) -> ApiResult<(StatusCode, Json<TenantResponse>)> {
    let tenant = state
        .tenant_service
        .create_tenant(&user, request.into_profile()?)
        .await?;

    Ok((StatusCode::CREATED, Json(TenantResponse::from(tenant))))
}

/// Returns the caller's tenant.
pub async fn get_current_tenant_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<TenantResponse>> {
    let tenant = state
        .tenant_service
        .get_tenant(&user, user.tenant_scope())
        .await?;

    Ok(Json(TenantResponse::from(tenant)))
}

/// Updates the caller's tenant profile.
pub async fn update_current_tenant_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<SaveTenantRequest>,
) -> ApiResult<Json<TenantResponse>> {
    let tenant = state
        .tenant_service
        .update_tenant(&user, user.tenant_scope(), request.into_profile()?)
        .await?;

    Ok(Json(TenantResponse::from(tenant)))
}
