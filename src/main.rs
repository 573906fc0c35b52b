use assessment_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::{auth, rate_limit},
    routes, AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    // Hourly sweep for expired one-time video links and their objects.
    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60 * 60)).await;
                match state
                    .token_service
                    .cleanup_expired(&state.storage_service)
                    .await
                {
                    Ok(report) if report.expired_tokens > 0 => {
                        info!(
                            expired = report.expired_tokens,
                            deleted = report.videos_deleted,
                            failed = report.videos_failed,
                            "Expired video cleanup completed"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = ?e, "Expired video cleanup failed");
                    }
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/application/load", post(routes::application::load))
        .route("/api/application/save", post(routes::application::save))
        .route("/api/application/submit", post(routes::application::submit))
        .route("/api/application/log", post(routes::application::log_events))
        .route("/api/video/upload-url", post(routes::video::upload_url))
        .route("/api/video/commit", post(routes::video::commit))
        .route(
            "/api/video-access/:token_id",
            post(routes::video_access::redeem),
        )
        .route("/api/admin/login", post(routes::auth::admin_login))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RateLimiter::new(config.public_rps),
            rate_limit::rps_middleware,
        ));

    let admin_api = Router::new()
        .route("/api/admin/create-link", post(routes::admin::create_link))
        .route("/api/admin/submissions", get(routes::admin::list_submissions))
        .route(
            "/api/admin/submissions/:id",
            get(routes::admin::get_submission),
        )
        .route(
            "/api/admin/download/:id",
            get(routes::admin::download_submission),
        )
        .route("/api/admin/delete", post(routes::admin::delete_submissions))
        .route(
            "/api/admin/run-ai-score/:id",
            post(routes::admin::run_ai_score),
        )
        .route(
            "/api/admin/save-video-behavior/:id",
            post(routes::admin::save_video_behavior),
        )
        .route(
            "/api/admin/video-tokens/:id",
            post(routes::admin::generate_video_tokens),
        )
        .route(
            "/api/admin/cleanup-expired-videos",
            get(routes::admin::cleanup_preview).post(routes::admin::run_cleanup),
        )
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RateLimiter::new(config.admin_rps),
            rate_limit::rps_middleware,
        ));

    let super_admin_api = Router::new()
        .route(
            "/api/super-admin/trainers",
            get(routes::super_admin::list_trainers).post(routes::super_admin::create_trainer),
        )
        .route(
            "/api/super-admin/trainers/:id",
            patch(routes::super_admin::update_trainer)
                .delete(routes::super_admin::delete_trainer),
        )
        .route(
            "/api/super-admin/dashboard",
            get(routes::super_admin::dashboard),
        )
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_super_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RateLimiter::new(config.admin_rps),
            rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(admin_api)
        .merge(super_admin_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
