use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::dto::admin_dto::{
    CleanupPreviewResponse, CleanupResponse, FailedDeletion, VideoTokenGrant,
};
use crate::dto::application_dto::RedeemVideoResponse;
use crate::error::{Error, Result};
use crate::models::assessment::Assessment;
use crate::models::video::recordings_from_answers;
use crate::models::video_token::{
    RedemptionError, VideoAccessToken, PLAYBACK_URL_TTL_SECS,
};
use crate::services::storage_service::StorageService;
use crate::utils::token::generate_video_password;

#[derive(Clone)]
pub struct TokenService {
    pool: PgPool,
}

impl TokenService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mint one single-use token per stored recording. A failed insert for
    /// one recording is logged and skipped so the rest still get links.
    pub async fn generate_for_assessment(
        &self,
        assessment: &Assessment,
    ) -> Result<Vec<VideoTokenGrant>> {
        let recordings = recordings_from_answers(&assessment.answers);
        let mut grants = Vec::with_capacity(recordings.len());

        for recording in recordings {
            let password = generate_video_password();
            let expires_at = VideoAccessToken::expiry_for(recording.duration_sec, Utc::now());

            let inserted = sqlx::query_as::<_, VideoAccessToken>(
                r#"
                INSERT INTO video_access_tokens
                    (assessment_id, question_index, storage_path, password, expires_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(assessment.id)
            .bind(recording.question_index)
            .bind(&recording.storage_path)
            .bind(&password)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(token) => grants.push(VideoTokenGrant {
                    question_index: token.question_index,
                    token_id: token.id,
                    password,
                    expires_at: token.expires_at,
                }),
                Err(e) => {
                    tracing::error!(error = ?e, question_index = recording.question_index,
                        "Failed to create video access token");
                }
            }
        }

        Ok(grants)
    }

    /// One-time redemption. Check order: exists, password, expiry, used flag,
    /// each with its own status. Consuming the token is a conditional update
    /// so two concurrent redemptions cannot both win.
    pub async fn redeem(
        &self,
        token_id: Uuid,
        password: &str,
        storage: &StorageService,
    ) -> Result<RedeemVideoResponse> {
        let token = sqlx::query_as::<_, VideoAccessToken>(
            r#"SELECT * FROM video_access_tokens WHERE id = $1"#,
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Invalid or expired link".to_string()))?;

        token
            .check_redemption(password, Utc::now())
            .map_err(|e| match e {
                RedemptionError::WrongPassword => {
                    Error::Unauthorized("Incorrect password".to_string())
                }
                RedemptionError::Expired => Error::Gone("This link has expired".to_string()),
                RedemptionError::AlreadyUsed => {
                    Error::Gone("This link has already been used".to_string())
                }
            })?;

        let consumed = sqlx::query(
            r#"
            UPDATE video_access_tokens
            SET is_used = TRUE, accessed_at = $1
            WHERE id = $2 AND is_used = FALSE
            "#,
        )
        .bind(Utc::now())
        .bind(token_id)
        .execute(&self.pool)
        .await?;

        // Zero rows means a concurrent redemption got there first.
        if consumed.rows_affected() == 0 {
            return Err(Error::Gone("This link has already been used".to_string()));
        }

        let video_url = storage
            .create_signed_url(&token.storage_path, PLAYBACK_URL_TTL_SECS)
            .await?;

        Ok(RedeemVideoResponse {
            video_url,
            question_index: token.question_index,
        })
    }

    async fn expired_tokens(&self) -> Result<Vec<VideoAccessToken>> {
        let tokens = sqlx::query_as::<_, VideoAccessToken>(
            r#"SELECT * FROM video_access_tokens WHERE expires_at < $1"#,
        )
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;
        Ok(tokens)
    }

    pub async fn preview_cleanup(&self) -> Result<CleanupPreviewResponse> {
        let expired = self.expired_tokens().await?;
        let unique_paths: BTreeSet<&str> =
            expired.iter().map(|t| t.storage_path.as_str()).collect();
        Ok(CleanupPreviewResponse {
            expired_token_count: expired.len(),
            unique_videos_to_delete: unique_paths.len(),
        })
    }

    /// Expiry sweep: delete the backing video objects for expired tokens
    /// (deduplicated by storage path, since several tokens can reference one
    /// recording), then delete the token rows. Object deletion failures are
    /// reported but do not block the row cleanup.
    pub async fn cleanup_expired(&self, storage: &StorageService) -> Result<CleanupResponse> {
        let expired = self.expired_tokens().await?;
        if expired.is_empty() {
            return Ok(CleanupResponse {
                message: "No expired videos to clean up".to_string(),
                expired_tokens: 0,
                videos_deleted: 0,
                videos_failed: 0,
                deleted_paths: vec![],
                failed_paths: vec![],
            });
        }

        let unique_paths: BTreeSet<String> =
            expired.iter().map(|t| t.storage_path.clone()).collect();

        let mut deleted_paths = Vec::new();
        let mut failed_paths = Vec::new();
        for path in unique_paths {
            match storage.remove_objects(std::slice::from_ref(&path)).await {
                Ok(()) => deleted_paths.push(path),
                Err(e) => {
                    tracing::error!(error = ?e, path = %path, "Failed to delete expired video");
                    failed_paths.push(FailedDeletion {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        sqlx::query(r#"DELETE FROM video_access_tokens WHERE expires_at < $1"#)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(CleanupResponse {
            message: "Cleanup completed".to_string(),
            expired_tokens: expired.len(),
            videos_deleted: deleted_paths.len(),
            videos_failed: failed_paths.len(),
            deleted_paths,
            failed_paths,
        })
    }
}
