use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use veritrail_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the bearer token into a request identity or rejects with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

    let identity = state.identity_service.authenticate(token).await?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
