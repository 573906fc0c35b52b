use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::assessment::Assessment;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub admin_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateLinkResponse {
    pub ok: bool,
    pub token: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionListResponse {
    pub items: Vec<Assessment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLink {
    pub question_index: i32,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetailResponse {
    pub item: Assessment,
    pub video_links: Vec<VideoLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSubmissionsRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteSubmissionsResponse {
    pub success: bool,
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTokenGrant {
    pub question_index: i32,
    pub token_id: Uuid,
    pub password: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateVideoTokensResponse {
    pub tokens: Vec<VideoTokenGrant>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDeletion {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub message: String,
    pub expired_tokens: usize,
    pub videos_deleted: usize,
    pub videos_failed: usize,
    pub deleted_paths: Vec<String>,
    pub failed_paths: Vec<FailedDeletion>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupPreviewResponse {
    pub expired_token_count: usize,
    pub unique_videos_to_delete: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: i64,
    pub submitted: i64,
    pub in_progress: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub items: Vec<Assessment>,
}
