use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use metrics::counter;
use veritrail_core::UserIdentity;
use veritrail_domain::WorkflowStage;

use crate::dto::{
    AdvanceStageRequest, AssessmentResponse, AssignAssessmentRequest, SubmitResponsesRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists assessment assignments visible to the caller.
pub async fn list_assessments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<AssessmentResponse>>> {
    let assessments = state
        .assessment_service
        .list_assessments(&user)
        .await?
        .into_iter()
        .map(AssessmentResponse::from)
        .collect();

    Ok(Json(assessments))
}

/// Returns one assessment assignment.
pub async fn get_assessment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(assessment_id): Path<String>,
) -> ApiResult<Json<AssessmentResponse>> {
    let assessment = state
        .assessment_service
        .get_assessment(&user, &assessment_id)
        .await?;

    Ok(Json(AssessmentResponse::from(assessment)))
}

/// Assigns a questionnaire to a subject.
pub async fn assign_assessment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<AssignAssessmentRequest>,
) -> ApiResult<(StatusCode, Json<AssessmentResponse>)> {
    let assessment = state
        .assessment_service
        .assign_assessment(&user, request.into_spec()?)
        .await?;

    Ok((StatusCode::CREATED, Json(AssessmentResponse::from(assessment))))
}

/// Stores questionnaire responses submitted by the assignee.
pub async fn submit_responses_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(assessment_id): Path<String>,
    Json(request): Json<SubmitResponsesRequest>,
) -> ApiResult<Json<AssessmentResponse>> {
    let assessment = state
        .assessment_service
        .submit_responses(&user, &assessment_id, request.responses)
        .await?;

    Ok(Json(AssessmentResponse::from(assessment)))
}

/// Advances the assignment workflow stage.
pub async fn advance_assessment_stage_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(assessment_id): Path<String>,
    Json(request): Json<AdvanceStageRequest>,
) -> ApiResult<Json<AssessmentResponse>> {
    let stage = WorkflowStage::new(request.stage)?;
    let assessment = state
        .assessment_service
        .advance_stage(&user, &assessment_id, stage)
        .await?;

    counter!("workflow_stage_advances_total", "resource" => "assessment").increment(1);
    Ok(Json(AssessmentResponse::from(assessment)))
}
