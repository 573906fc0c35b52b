use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::{DashboardQuery, DashboardResponse, DashboardStats};
use crate::dto::auth_dto::{
    CreateTrainerRequest, TrainerListResponse, TrainerResponse, TrainerSummary,
    UpdateTrainerRequest,
};
use crate::models::admin::Admin;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_trainers(State(state): State<AppState>) -> crate::error::Result<Response> {
    let trainers = state.auth_service.list_trainers().await?;
    Ok(Json(TrainerListResponse {
        trainers: trainers.iter().map(TrainerSummary::from).collect(),
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn create_trainer(
    State(state): State<AppState>,
    Extension(current): Extension<Admin>,
    Json(req): Json<CreateTrainerRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let trainer = state
        .auth_service
        .create_trainer(&req.email, &req.name, &req.password, current.id)
        .await?;
    Ok(Json(TrainerResponse {
        trainer: TrainerSummary::from(&trainer),
    })
    .into_response())
}

/// Toggle a trainer's active flag. Deactivation also kills their sessions.
#[axum::debug_handler]
pub async fn update_trainer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTrainerRequest>,
) -> crate::error::Result<Response> {
    state.auth_service.set_trainer_active(id, req.is_active).await?;
    Ok(Json(serde_json::json!({"success": true})).into_response())
}

/// Soft delete: deactivate and purge sessions. The row stays for audit.
#[axum::debug_handler]
pub async fn delete_trainer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    state.auth_service.set_trainer_active(id, false).await?;
    Ok(Json(serde_json::json!({"success": true})).into_response())
}

#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> crate::error::Result<Response> {
    let sort_by = query.sort_by.as_deref().unwrap_or("recent");
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let (total, submitted, in_progress) = state.assessment_service.status_counts().await?;
    let items = state
        .assessment_service
        .dashboard_items(sort_by, limit, offset)
        .await?;

    Ok(Json(DashboardResponse {
        stats: DashboardStats {
            total,
            submitted,
            in_progress,
        },
        items,
    })
    .into_response())
}
