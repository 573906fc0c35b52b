use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Json, Response},
};
use serde_json::json;
use validator::Validate;

use crate::dto::auth_dto::{AdminLoginRequest, AdminPublic, LoginRequest, LoginResponse, MeResponse};
use crate::middleware::auth::{
    admin_cookie, cookie_value, expired_cookie, session_cookie, ADMIN_COOKIE, SESSION_COOKIE,
};
use crate::utils::crypto::secrets_match;
use crate::AppState;

/// Legacy shared-password login. Grants the flag cookie, no identity.
#[axum::debug_handler]
pub async fn admin_login(
    State(_state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let config = crate::config::get_config();
    if !secrets_match(&req.password, &config.admin_password) {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid password"})),
        )
            .into_response());
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, admin_cookie())]),
        Json(json!({"success": true})),
    )
        .into_response())
}

/// Trainer / super-admin login. Verifies credentials, mints a session and
/// sets the session cookie.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let Some(admin) = state
        .auth_service
        .authenticate(&req.email, &req.password)
        .await?
    else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid email or password"})),
        )
            .into_response());
    };

    let raw_token = state.auth_service.create_session(admin.id).await?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&raw_token))]),
        Json(LoginResponse {
            success: true,
            admin: AdminPublic::from(&admin),
        }),
    )
        .into_response())
}

/// Logout clears both cookies and deletes the session row if one exists.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> crate::error::Result<Response> {
    if let Some(raw_token) = cookie_value(&headers, SESSION_COOKIE) {
        state.auth_service.delete_session(&raw_token).await?;
    }
    Ok((
        AppendHeaders([
            (header::SET_COOKIE, expired_cookie(SESSION_COOKIE)),
            (header::SET_COOKIE, expired_cookie(ADMIN_COOKIE)),
        ]),
        Json(json!({"success": true})),
    )
        .into_response())
}

/// Who am I. Session identity wins; the flag cookie yields an anonymous
/// admin principal so the dashboard can render without a name.
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> crate::error::Result<Response> {
    if let Some(raw_token) = cookie_value(&headers, SESSION_COOKIE) {
        if let Some((_, admin)) = state.auth_service.resolve_session(&raw_token).await? {
            return Ok(Json(MeResponse {
                admin: AdminPublic::from(&admin),
            })
            .into_response());
        }
    }

    if let Some(flag) = cookie_value(&headers, ADMIN_COOKIE) {
        if secrets_match(&flag, &crate::middleware::auth::admin_cookie_value()) {
            return Ok(Json(json!({"admin": {"role": "admin"}})).into_response());
        }
    }

    Ok((
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Not authenticated"})),
    )
        .into_response())
}
