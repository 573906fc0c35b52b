use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::RedeemVideoRequest;
use crate::AppState;

/// Redeem a one-time video link. The password is checked before the token is
/// consumed; a wrong password does not burn the link.
#[axum::debug_handler]
pub async fn redeem(
    State(state): State<AppState>,
    Path(token_id): Path<Uuid>,
    Json(req): Json<RedeemVideoRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let response = state
        .token_service
        .redeem(token_id, &req.password, &state.storage_service)
        .await?;
    Ok(Json(response).into_response())
}
