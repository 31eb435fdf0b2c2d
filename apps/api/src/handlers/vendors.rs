use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use metrics::counter;
use veritrail_core::UserIdentity;
use veritrail_domain::WorkflowStage;

use crate::dto::{AdvanceStageRequest, SaveVendorRequest, VendorResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists vendors visible to the caller.
pub async fn list_vendors_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<VendorResponse>>> {
    let vendors = state
        .vendor_service
        .list_vendors(&user)
        .await?
        .into_iter()
        .map(VendorResponse::from)
        .collect();

    Ok(Json(vendors))
}

/// Returns one vendor.
pub async fn get_vendor_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(vendor_id): Path<String>,
) -> ApiResult<Json<VendorResponse>> {
    let vendor = state.vendor_service.get_vendor(&user, &vendor_id).await?;
    Ok(Json(VendorResponse::from(vendor)))
}

/// Creates a vendor.
pub async fn create_vendor_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<SaveVendorRequest>,
) -> ApiResult<(StatusCode, Json<VendorResponse>)> {
    let vendor = state
        .vendor_service
        .create_vendor(&user, request.into_profile()?)
        .await?;

    Ok((StatusCode::CREATED, Json(VendorResponse::from(vendor))))
}

/// Updates vendor profile fields.
pub async fn update_vendor_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(vendor_id): Path<String>,
    Json(request): Json<SaveVendorRequest>,
) -> ApiResult<Json<VendorResponse>> {
    let vendor = state
        .vendor_service
        .update_vendor(&user, &vendor_id, request.into_profile()?)
        .await?;

    Ok(Json(VendorResponse::from(vendor)))
}

/// Advances the vendor workflow stage.
pub async fn advance_vendor_stage_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(vendor_id): Path<String>,
    Json(request): Json<AdvanceStageRequest>,
) -> ApiResult<Json<VendorResponse>> {
    let stage = WorkflowStage::new(request.stage)?;
    let vendor = state
        .vendor_service
        .advance_stage(&user, &vendor_id, stage)
        .await?;

    counter!("workflow_stage_advances_total", "resource" => "vendor").increment(1);
    Ok(Json(VendorResponse::from(vendor)))
}

/// Soft-deletes a vendor.
pub async fn delete_vendor_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(vendor_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.vendor_service.delete_vendor(&user, &vendor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
