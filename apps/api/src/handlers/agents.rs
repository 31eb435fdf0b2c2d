use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use metrics::counter;
use veritrail_core::UserIdentity;
use veritrail_domain::WorkflowStage;

use crate::dto::{AdvanceStageRequest, AgentResponse, SaveAgentRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists agents visible to the caller.
pub async fn list_agents_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<AgentResponse>>> {
    let agents = state
        .agent_service
        .list_agents(&user)
        .await?
        .into_iter()
        .map(AgentResponse::from)
        .collect();

    Ok(Json(agents))
}

/// Returns one agent.
pub async fn get_agent_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<AgentResponse>> {
    let agent = state.agent_service.get_agent(&user, &agent_id).await?;
    Ok(Json(AgentResponse::from(agent)))
}

/// Registers an agent.
pub async fn create_agent_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<SaveAgentRequest>,
) -> ApiResult<(StatusCode, Json<AgentResponse>)> {
    let agent = state
        .agent_service
        .create_agent(&user, request.into_profile()?)
        .await?;

    Ok((StatusCode::CREATED, Json(AgentResponse::from(agent))))
}

/// Updates agent profile fields.
pub async fn update_agent_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(agent_id): Path<String>,
    Json(request): Json<SaveAgentRequest>,
) -> ApiResult<Json<AgentResponse>> {
    let agent = state
        .agent_service
        .update_agent(&user, &agent_id, request.into_profile()?)
        .await?;

    Ok(Json(AgentResponse::from(agent)))
}

/// Advances the agent workflow stage.
pub async fn advance_agent_stage_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(agent_id): Path<String>,
    Json(request): Json<AdvanceStageRequest>,
) -> ApiResult<Json<AgentResponse>> {
    let stage = WorkflowStage::new(request.stage)?;
    let agent = state
        .agent_service
        .advance_stage(&user, &agent_id, stage)
        .await?;

    counter!("workflow_stage_advances_total", "resource" => "agent").increment(1);
    Ok(Json(AgentResponse::from(agent)))
}

/// Removes an agent registration.
pub async fn delete_agent_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(agent_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.agent_service.delete_agent(&user, &agent_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
