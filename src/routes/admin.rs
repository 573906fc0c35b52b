use axum::{
    extract::{Path, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Json, Response},
    Extension,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::dto::admin_dto::{
    CreateLinkRequest, CreateLinkResponse, DeleteSubmissionsRequest, DeleteSubmissionsResponse,
    GenerateVideoTokensResponse, SubmissionDetailResponse, SubmissionListResponse, VideoLink,
};
use crate::dto::application_dto::OkResponse;
use crate::middleware::auth::AuthContext;
use crate::models::video::recordings_from_answers;
use crate::services::scoring_service::{role_label, ScoringInput};
use crate::AppState;

/// Review links for the admin detail view live much shorter than one-time
/// share links.
const REVIEW_URL_TTL_SECS: u32 = 60 * 60;

#[axum::debug_handler]
pub async fn create_link(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateLinkRequest>,
) -> crate::error::Result<Response> {
    let trainer_id = auth.admin.as_ref().map(|a| a.id);
    let assessment = state
        .assessment_service
        .create(req.admin_label, trainer_id)
        .await?;

    let config = crate::config::get_config();
    let url = format!(
        "{}/assessment?token={}",
        config.app_base_url.trim_end_matches('/'),
        assessment.token
    );
    Ok(Json(CreateLinkResponse {
        ok: true,
        token: assessment.token,
        url,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn list_submissions(State(state): State<AppState>) -> crate::error::Result<Response> {
    let items = state.assessment_service.list_recent().await?;
    Ok(Json(SubmissionListResponse { items }).into_response())
}

/// Submission detail with short-lived signed playback links for every stored
/// recording. A recording whose signed URL cannot be generated is skipped
/// rather than failing the whole view.
#[axum::debug_handler]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let item = state.assessment_service.get_by_id(id).await?;

    let mut video_links = Vec::new();
    for recording in recordings_from_answers(&item.answers) {
        match state
            .storage_service
            .create_signed_url(&recording.storage_path, REVIEW_URL_TTL_SECS)
            .await
        {
            Ok(url) => video_links.push(VideoLink {
                question_index: recording.question_index,
                url,
            }),
            Err(e) => {
                tracing::error!(error = ?e, path = %recording.storage_path,
                    "Failed to sign review URL");
            }
        }
    }

    Ok(Json(SubmissionDetailResponse { item, video_links }).into_response())
}

/// The full record as a downloadable JSON attachment.
#[axum::debug_handler]
pub async fn download_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let item = state.assessment_service.get_by_id(id).await?;
    let filename = format!("assessment-{}.json", item.id);
    let body = serde_json::to_string_pretty(&item)?;
    Ok((
        AppendHeaders([
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ]),
        body,
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn delete_submissions(
    State(state): State<AppState>,
    Json(req): Json<DeleteSubmissionsRequest>,
) -> crate::error::Result<Response> {
    let deleted = state
        .assessment_service
        .delete_many(&req.ids, &state.storage_service)
        .await?;
    Ok(Json(DeleteSubmissionsResponse {
        success: true,
        deleted,
    })
    .into_response())
}

/// Run the LLM evaluation for one submission and persist the result.
#[axum::debug_handler]
pub async fn run_ai_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let item = state.assessment_service.get_by_id(id).await?;

    let selected_role = item
        .answers
        .pointer("/domain/selectedRoleId")
        .and_then(|v| v.as_str());
    let input = ScoringInput {
        role_label: selected_role.and_then(role_label).map(str::to_string),
        answers: item.answers.clone(),
        proctoring: item.proctoring.clone(),
        video_behavior: item.video_behavior.clone().unwrap_or(JsonValue::Null),
    };

    let evaluation = state.scoring_service.evaluate(&input).await?;
    let evaluation_json = serde_json::to_value(&evaluation)?;
    state
        .assessment_service
        .store_evaluation(id, &evaluation_json)
        .await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "evaluation": evaluation_json,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn save_video_behavior(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(behavior): Json<JsonValue>,
) -> crate::error::Result<Response> {
    state
        .assessment_service
        .save_video_behavior(id, &behavior)
        .await?;
    Ok(Json(OkResponse { ok: true }).into_response())
}

/// Mint one-time password-protected share links for every recording of a
/// submission.
#[axum::debug_handler]
pub async fn generate_video_tokens(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let item = state.assessment_service.get_by_id(id).await?;
    let tokens = state.token_service.generate_for_assessment(&item).await?;
    Ok(Json(GenerateVideoTokensResponse { tokens }).into_response())
}

#[axum::debug_handler]
pub async fn cleanup_preview(State(state): State<AppState>) -> crate::error::Result<Response> {
    let preview = state.token_service.preview_cleanup().await?;
    Ok(Json(preview).into_response())
}

#[axum::debug_handler]
pub async fn run_cleanup(State(state): State<AppState>) -> crate::error::Result<Response> {
    let report = state
        .token_service
        .cleanup_expired(&state.storage_service)
        .await?;
    Ok(Json(report).into_response())
}
