use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::application_dto::{
    CommitVideoRequest, LoadResponse, UploadUrlRequest, UploadUrlResponse,
};
use crate::AppState;

/// Phase one of the upload pipeline: hand the browser a signed PUT
/// destination so video bytes never pass through this server.
#[axum::debug_handler]
pub async fn upload_url(
    State(state): State<AppState>,
    Json(req): Json<UploadUrlRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let (signed_url, storage_path) = state
        .video_service
        .create_upload_url(&req.token, req.question_index, &state.storage_service)
        .await?;
    Ok(Json(UploadUrlResponse {
        signed_url,
        storage_path,
    })
    .into_response())
}

/// Phase two: record the uploaded object's metadata against the assessment.
#[axum::debug_handler]
pub async fn commit(
    State(state): State<AppState>,
    Json(req): Json<CommitVideoRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let assessment = state.video_service.commit_recording(&req).await?;
    Ok(Json(LoadResponse {
        ok: true,
        assessment,
    })
    .into_response())
}
