use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use veritrail_core::{AppError, UserIdentity};

use crate::dto::{MasterDataListResponse, SaveMasterDataListRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists master data lists.
pub async fn list_master_data_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<MasterDataListResponse>>> {
    let lists = state
        .master_data_service
        .list_lists(&user)
        .await?
        .into_iter()
        .map(MasterDataListResponse::from)
        .collect();

    Ok(Json(lists))
}

/// Returns one master data list.
pub async fn get_master_data_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(list_name): Path<String>,
) -> ApiResult<Json<MasterDataListResponse>> {
    let list = state.master_data_service.get_list(&user, &list_name).await?;
    Ok(Json(MasterDataListResponse::from(list)))
}

/// Creates a master data list.
pub async fn create_master_data_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<SaveMasterDataListRequest>,
) -> ApiResult<(StatusCode, Json<MasterDataListResponse>)> {
    let list = state
        .master_data_service
        .save_list(&user, request.into_list()?)
        .await?;

    Ok((StatusCode::CREATED, Json(MasterDataListResponse::from(list))))
}

/// Replaces a master data list and its values.
pub async fn update_master_data_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(list_name): Path<String>,
    Json(request): Json<SaveMasterDataListRequest>,
) -> ApiResult<Json<MasterDataListResponse>> {
    let list = request.into_list()?;
    if list.name() != list_name {
        return Err(AppError::Validation(format!(
            "list name '{}' does not match path '{list_name}'",
            list.name()
        ))
        .into());
    }

    let list = state.master_data_service.save_list(&user, list).await?;
    Ok(Json(MasterDataListResponse::from(list)))
}

/// Deletes a master data list.
pub async fn delete_master_data_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(list_name): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .master_data_service
        .delete_list(&user, &list_name)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
