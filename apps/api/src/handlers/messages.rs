use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use veritrail_application::PostMessageInput;
use veritrail_core::UserIdentity;
use veritrail_domain::{MessageBody, ResourceKind};

use crate::dto::{MessageResponse, PostMessageRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists a resource thread in creation order.
pub async fn list_thread_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((resource_kind, resource_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    let resource_kind = ResourceKind::from_str(resource_kind.as_str())?;
    let messages = state
        .message_service
        .list_thread(&user, resource_kind, &resource_id)
        .await?
        .into_iter()
        .map(MessageResponse::from)
        .collect();

    Ok(Json(messages))
}

/// Posts a message or reply to a resource thread.
pub async fn post_message_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((resource_kind, resource_id)): Path<(String, String)>,
    Json(request): Json<PostMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let input = PostMessageInput {
        resource_kind: ResourceKind::from_str(resource_kind.as_str())?,
        resource_id,
        parent_id: request.parent_id,
        body: MessageBody::new(request.body)?,
    };

    let message = state.message_service.post_message(&user, input).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}
