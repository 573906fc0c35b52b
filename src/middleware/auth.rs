use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::models::admin::Admin;
use crate::utils::crypto::{hash_session_token, secrets_match};
use crate::AppState;

pub const ADMIN_COOKIE: &str = "admin_auth";
pub const SESSION_COOKIE: &str = "session_token";

const ADMIN_COOKIE_MAX_AGE_SECS: i64 = 8 * 60 * 60;
const SESSION_COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Principal attached to requests that pass `require_admin`. The legacy
/// password cookie carries no identity, so `admin` is None on that path.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub admin: Option<Admin>,
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

/// Expected value of the admin flag cookie. The raw password never goes
/// into the cookie jar.
pub fn admin_cookie_value() -> String {
    hash_session_token(&crate::config::get_config().admin_password)
}

pub fn build_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    let config = crate::config::get_config();
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age_secs
    );
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn admin_cookie() -> String {
    build_cookie(ADMIN_COOKIE, &admin_cookie_value(), ADMIN_COOKIE_MAX_AGE_SECS)
}

pub fn session_cookie(raw_token: &str) -> String {
    build_cookie(SESSION_COOKIE, raw_token, SESSION_COOKIE_MAX_AGE_SECS)
}

pub fn expired_cookie(name: &str) -> String {
    build_cookie(name, "", 0)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Authentication required"})),
    )
        .into_response()
}

/// Gate for the admin surface. Accepts either the shared-password flag
/// cookie or a live trainer/super-admin session.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(flag) = cookie_value(req.headers(), ADMIN_COOKIE) {
        if secrets_match(&flag, &admin_cookie_value()) {
            req.extensions_mut().insert(AuthContext { admin: None });
            return next.run(req).await;
        }
    }

    if let Some(raw_token) = cookie_value(req.headers(), SESSION_COOKIE) {
        match state.auth_service.resolve_session(&raw_token).await {
            Ok(Some((_, admin))) => {
                req.extensions_mut().insert(AuthContext { admin: Some(admin) });
                return next.run(req).await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = ?e, "Session lookup failed");
                return e.into_response();
            }
        }
    }

    unauthorized()
}

/// Gate for the trainer-management surface. Only a live session whose
/// principal is a super admin passes; the flag cookie is not enough.
pub async fn require_super_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(raw_token) = cookie_value(req.headers(), SESSION_COOKIE) else {
        return unauthorized();
    };

    let resolved = match state.auth_service.resolve_session(&raw_token).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(error = ?e, "Session lookup failed");
            return e.into_response();
        }
    };

    match resolved {
        Some((_, admin)) if admin.is_super_admin() => {
            req.extensions_mut().insert(admin);
            next.run(req).await
        }
        Some(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Super admin access required"})),
        )
            .into_response(),
        None => unauthorized(),
    }
}
