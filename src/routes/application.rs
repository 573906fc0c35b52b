use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::application_dto::{
    LoadRequest, LoadResponse, LogEventsRequest, OkResponse, SaveRequest, SubmitRequest,
};
use crate::AppState;

/// Load (resume) an assessment by its candidate token. The token is the only
/// credential a candidate ever holds.
#[axum::debug_handler]
pub async fn load(
    State(state): State<AppState>,
    Json(req): Json<LoadRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let assessment = state.assessment_service.get_by_token(&req.token).await?;
    Ok(Json(LoadResponse {
        ok: true,
        assessment,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn save(
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let assessment = state
        .assessment_service
        .save_answers(&req.token, &req.answers_patch, req.current_step)
        .await?;
    Ok(Json(LoadResponse {
        ok: true,
        assessment,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let assessment = state.assessment_service.submit(&req.token).await?;
    Ok(Json(LoadResponse {
        ok: true,
        assessment,
    })
    .into_response())
}

/// Batched proctoring event sink. Always replies ok on accepted batches so
/// the client never retries into a feedback loop.
#[axum::debug_handler]
pub async fn log_events(
    State(state): State<AppState>,
    Json(req): Json<LogEventsRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    state
        .proctoring_service
        .log_events(&req.token, &req.events)
        .await?;
    Ok(Json(OkResponse { ok: true }).into_response())
}
