use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use metrics::counter;
use veritrail_core::UserIdentity;

use crate::dto::{DecideOnboardingRequest, OnboardingRequestResponse, SubmitOnboardingRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists onboarding requests visible to the caller.
pub async fn list_onboarding_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<OnboardingRequestResponse>>> {
    let requests = state
        .onboarding_service
        .list_requests(&user)
        .await?
        .into_iter()
        .map(OnboardingRequestResponse::from)
        .collect();

    Ok(Json(requests))
}

/// Returns one onboarding request.
pub async fn get_onboarding_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<OnboardingRequestResponse>> {
    let request = state
        .onboarding_service
        .get_request(&user, &request_id)
        .await?;

    Ok(Json(OnboardingRequestResponse::from(request)))
}

/// Submits a new onboarding request.
pub async fn submit_onboarding_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(request): Json<SubmitOnboardingRequest>,
) -> ApiResult<(StatusCode, Json<OnboardingRequestResponse>)> {
    let created = state
        .onboarding_service
        .submit_request(&user, request.into_spec()?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OnboardingRequestResponse::from(created)),
    ))
}

/// Records an approval or rejection.
pub async fn decide_onboarding_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(request_id): Path<String>,
    Json(request): Json<DecideOnboardingRequest>,
) -> ApiResult<Json<OnboardingRequestResponse>> {
    let decision = request.decision()?;
    let decided = state
        .onboarding_service
        .decide_request(&user, &request_id, decision, request.note)
        .await?;

    counter!("onboarding_decisions_total", "decision" => decision.as_stage()).increment(1);
    Ok(Json(OnboardingRequestResponse::from(decided)))
}
