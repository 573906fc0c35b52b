use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::assessment::Assessment;
use crate::models::flow;
use crate::models::video::recordings_from_answers;
use crate::services::storage_service::StorageService;
use crate::utils::merge::deep_merge;
use crate::utils::token::generate_assessment_token;

/// Listing cap for the admin submissions view.
const LIST_LIMIT: i64 = 200;

#[derive(Clone)]
pub struct AssessmentService {
    pool: PgPool,
}

impl AssessmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        admin_label: Option<String>,
        created_by_trainer_id: Option<Uuid>,
    ) -> Result<Assessment> {
        let token = generate_assessment_token();
        let assessment = sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO candidate_assessments
                (token, admin_label, status, current_step, answers, proctoring, ai_evaluations, created_by_trainer_id)
            VALUES
                ($1, $2, 'in_progress', 1, '{}'::jsonb, '{"counts": {}, "events": []}'::jsonb, '{}'::jsonb, $3)
            RETURNING *
            "#,
        )
        .bind(&token)
        .bind(admin_label)
        .bind(created_by_trainer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(assessment)
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Assessment> {
        sqlx::query_as::<_, Assessment>(
            r#"SELECT * FROM candidate_assessments WHERE token = $1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Invalid link".to_string()))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Assessment> {
        sqlx::query_as::<_, Assessment>(r#"SELECT * FROM candidate_assessments WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))
    }

    /// Deep-merge an answers patch and optionally move the persisted step.
    ///
    /// Object fields merge key-by-key, arrays and scalars replace. A forward
    /// step move is validated against the gating predicates of every step
    /// being left; backward moves always pass.
    pub async fn save_answers(
        &self,
        token: &str,
        answers_patch: &JsonValue,
        current_step: Option<i32>,
    ) -> Result<Assessment> {
        let existing = self.get_by_token(token).await?;
        let (merged, next_step) = apply_save(&existing, answers_patch, current_step)?;

        let updated = sqlx::query_as::<_, Assessment>(
            r#"
            UPDATE candidate_assessments
            SET answers = $1, current_step = $2, updated_at = NOW()
            WHERE token = $3
            RETURNING *
            "#,
        )
        .bind(&merged)
        .bind(next_step)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// One-way transition to submitted. Idempotent: submitting an already
    /// submitted assessment is a no-op success.
    pub async fn submit(&self, token: &str) -> Result<Assessment> {
        let existing = self.get_by_token(token).await?;
        if existing.is_submitted() {
            return Ok(existing);
        }
        if !flow::ready_to_submit(&existing.answers) {
            return Err(Error::BadRequest(
                "Assessment is not complete".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Assessment>(
            r#"
            UPDATE candidate_assessments
            SET status = 'submitted', submitted_at = $1, updated_at = $1
            WHERE token = $2
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn list_recent(&self) -> Result<Vec<Assessment>> {
        let items = sqlx::query_as::<_, Assessment>(
            r#"SELECT * FROM candidate_assessments ORDER BY updated_at DESC LIMIT $1"#,
        )
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Delete assessments and their stored videos. Object deletion is best
    /// effort: a storage failure is logged and the rows are removed anyway.
    pub async fn delete_many(
        &self,
        ids: &[Uuid],
        storage: &StorageService,
    ) -> Result<usize> {
        if ids.is_empty() {
            return Err(Error::BadRequest(
                "Invalid request: ids array required".to_string(),
            ));
        }

        let items = sqlx::query_as::<_, Assessment>(
            r#"SELECT * FROM candidate_assessments WHERE id = ANY($1)"#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let storage_paths: Vec<String> = items
            .iter()
            .flat_map(|item| recordings_from_answers(&item.answers))
            .map(|r| r.storage_path)
            .collect();

        if !storage_paths.is_empty() {
            if let Err(e) = storage.remove_objects(&storage_paths).await {
                tracing::error!(error = ?e, "Storage deletion failed, deleting rows anyway");
            }
        }

        sqlx::query(r#"DELETE FROM candidate_assessments WHERE id = ANY($1)"#)
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(ids.len())
    }

    pub async fn save_video_behavior(&self, id: Uuid, behavior: &JsonValue) -> Result<()> {
        let result = sqlx::query(
            r#"UPDATE candidate_assessments SET video_behavior = $1, updated_at = NOW() WHERE id = $2"#,
        )
        .bind(behavior)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Assessment not found".to_string()));
        }
        Ok(())
    }

    /// Store an AI evaluation under `ai_evaluations.overall`, preserving any
    /// other keys in the document.
    pub async fn store_evaluation(&self, id: Uuid, evaluation: &JsonValue) -> Result<()> {
        let existing = self.get_by_id(id).await?;
        let mut evaluations = match existing.ai_evaluations {
            JsonValue::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        evaluations.insert("overall".to_string(), evaluation.clone());

        sqlx::query(
            r#"UPDATE candidate_assessments SET ai_evaluations = $1, updated_at = NOW() WHERE id = $2"#,
        )
        .bind(JsonValue::Object(evaluations))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn status_counts(&self) -> Result<(i64, i64, i64)> {
        let total: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM candidate_assessments"#)
                .fetch_one(&self.pool)
                .await?;
        let submitted: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM candidate_assessments WHERE status = 'submitted'"#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok((total, submitted, total - submitted))
    }

    /// Dashboard listing. Score sorts order in memory by the stored AI
    /// overall score, since it lives inside the evaluations document.
    pub async fn dashboard_items(
        &self,
        sort_by: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Assessment>> {
        let mut items = match sort_by {
            "submitted" => {
                sqlx::query_as::<_, Assessment>(
                    r#"
                    SELECT * FROM candidate_assessments
                    WHERE status = 'submitted'
                    ORDER BY submitted_at DESC NULLS LAST
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            _ => {
                sqlx::query_as::<_, Assessment>(
                    r#"
                    SELECT * FROM candidate_assessments
                    ORDER BY updated_at DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        match sort_by {
            "high_score" => {
                items.sort_by(|a, b| {
                    overall_score(b)
                        .partial_cmp(&overall_score(a))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            "low_score" => {
                items.sort_by(|a, b| {
                    overall_score(a)
                        .partial_cmp(&overall_score(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            _ => {}
        }

        Ok(items)
    }
}

/// The save decision, separated from the persistence call. Submitted records
/// are immutable: the call is rejected before any merge happens. A forward
/// step move must satisfy the gating predicates over the merged answers.
fn apply_save(
    existing: &Assessment,
    answers_patch: &JsonValue,
    requested_step: Option<i32>,
) -> Result<(JsonValue, i32)> {
    if existing.is_submitted() {
        return Err(Error::Conflict("Already submitted".to_string()));
    }

    let merged = deep_merge(&existing.answers, answers_patch);
    let next_step = match requested_step {
        Some(step) => {
            if !flow::can_move_to(existing.current_step, step, &merged) {
                return Err(Error::BadRequest(
                    "Step requirements not met".to_string(),
                ));
            }
            step
        }
        None => existing.current_step,
    };
    Ok((merged, next_step))
}

fn overall_score(item: &Assessment) -> f64 {
    item.ai_evaluations
        .pointer("/overall/overallScore0to100")
        .and_then(|v| v.as_f64())
        .unwrap_or(-1.0)
}
