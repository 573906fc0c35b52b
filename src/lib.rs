pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    assessment_service::AssessmentService, auth_service::AuthService,
    proctoring_service::ProctoringService, scoring_service::ScoringService,
    storage_service::StorageService, token_service::TokenService, video_service::VideoService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub assessment_service: AssessmentService,
    pub proctoring_service: ProctoringService,
    pub video_service: VideoService,
    pub token_service: TokenService,
    pub auth_service: AuthService,
    pub storage_service: StorageService,
    pub scoring_service: ScoringService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let assessment_service = AssessmentService::new(pool.clone());
        let proctoring_service = ProctoringService::new(pool.clone());
        let video_service = VideoService::new(pool.clone());
        let token_service = TokenService::new(pool.clone());
        let auth_service = AuthService::new(pool.clone());
        let storage_service = StorageService::new(
            config.storage_api_url.clone(),
            config.storage_service_key.clone(),
            config.storage_bucket.clone(),
            http_client.clone(),
        );
        let scoring_service = ScoringService::new(
            config.groq_api_key.clone(),
            config.groq_model.clone(),
            http_client,
        );

        Self {
            pool,
            assessment_service,
            proctoring_service,
            video_service,
            token_service,
            auth_service,
            storage_service,
            scoring_service,
        }
    }
}
