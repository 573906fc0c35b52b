use chrono::Utc;
use sqlx::PgPool;

use crate::dto::application_dto::CommitVideoRequest;
use crate::error::{Error, Result};
use crate::models::assessment::Assessment;
use crate::models::video::{clamp_question_index, upsert_recording, VideoRecording};
use crate::services::assessment_service::AssessmentService;
use crate::services::storage_service::StorageService;

#[derive(Clone)]
pub struct VideoService {
    pool: PgPool,
}

impl VideoService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Phase one of the upload pipeline: a signed destination for a direct
    /// browser PUT, scoped to this assessment and question slot.
    pub async fn create_upload_url(
        &self,
        token: &str,
        question_index: i32,
        storage: &StorageService,
    ) -> Result<(String, String)> {
        let assessments = AssessmentService::new(self.pool.clone());
        let existing = assessments.get_by_token(token).await?;
        if existing.is_submitted() {
            return Err(Error::Conflict("Already submitted".to_string()));
        }

        let safe_index = clamp_question_index(question_index);
        let storage_path = format!(
            "videos/{}/q{}-{}.webm",
            existing.id,
            safe_index + 1,
            Utc::now().timestamp_millis()
        );

        let signed_url = storage.create_signed_upload_url(&storage_path).await?;
        Ok((signed_url, storage_path))
    }

    /// Phase two: commit the uploaded object's metadata, replacing any prior
    /// recording for the same question index. The two phases are not
    /// transactional; an upload without a commit leaves an orphaned object
    /// that the cleanup sweep does not target.
    pub async fn commit_recording(
        &self,
        req: &CommitVideoRequest,
    ) -> Result<Assessment> {
        let assessments = AssessmentService::new(self.pool.clone());
        let existing = assessments.get_by_token(&req.token).await?;
        let next_answers = apply_commit(&existing, req)?;

        let updated = sqlx::query_as::<_, Assessment>(
            r#"
            UPDATE candidate_assessments
            SET answers = $1, updated_at = NOW()
            WHERE token = $2
            RETURNING *
            "#,
        )
        .bind(&next_answers)
        .bind(&req.token)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }
}

/// The commit decision, separated from persistence. A submitted assessment
/// rejects the commit before the answers document is touched.
fn apply_commit(
    existing: &Assessment,
    req: &CommitVideoRequest,
) -> Result<serde_json::Value> {
    if existing.is_submitted() {
        return Err(Error::Conflict("Already submitted".to_string()));
    }

    let recording = VideoRecording {
        question_index: req.question_index,
        storage_path: req.storage_path.clone(),
        duration_sec: req.duration_sec,
        size_bytes: req.size_bytes,
        created_at_iso: req
            .created_at_iso
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
    };
    Ok(upsert_recording(&existing.answers, recording))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessment::{STATUS_IN_PROGRESS, STATUS_SUBMITTED};
    use crate::models::video::recordings_from_answers;
    use serde_json::json;
    use uuid::Uuid;

    fn assessment(status: &str) -> Assessment {
        Assessment {
            id: Uuid::new_v4(),
            token: "t".to_string(),
            admin_label: None,
            status: status.to_string(),
            current_step: 5,
            answers: json!({
                "video": {"recordings": [
                    {"questionIndex": 0, "storagePath": "videos/a/q1-1.webm"}
                ]}
            }),
            proctoring: json!({"counts": {}, "events": []}),
            ai_evaluations: json!({}),
            video_behavior: None,
            created_by_trainer_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            submitted_at: None,
        }
    }

    fn commit_req(index: i32, path: &str) -> CommitVideoRequest {
        CommitVideoRequest {
            token: "t".to_string(),
            question_index: index,
            storage_path: path.to_string(),
            duration_sec: 30,
            size_bytes: 1024,
            created_at_iso: None,
        }
    }

    #[test]
    fn commit_against_a_submitted_record_is_rejected_as_conflict() {
        let item = assessment(STATUS_SUBMITTED);
        let result = apply_commit(&item, &commit_req(0, "videos/a/q1-2.webm"));
        assert!(matches!(result, Err(Error::Conflict(_))));
        // The stored recording list is untouched.
        let recordings = recordings_from_answers(&item.answers);
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].storage_path, "videos/a/q1-1.webm");
    }

    #[test]
    fn commit_on_an_open_record_replaces_the_slot() {
        let item = assessment(STATUS_IN_PROGRESS);
        let next = apply_commit(&item, &commit_req(0, "videos/a/q1-2.webm")).unwrap();
        let recordings = recordings_from_answers(&next);
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].storage_path, "videos/a/q1-2.webm");
    }

    #[test]
    fn commit_stamps_a_timestamp_when_the_client_sends_none() {
        let item = assessment(STATUS_IN_PROGRESS);
        let next = apply_commit(&item, &commit_req(1, "videos/a/q2-1.webm")).unwrap();
        let recordings = recordings_from_answers(&next);
        let slot1 = recordings.iter().find(|r| r.question_index == 1).unwrap();
        assert!(!slot1.created_at_iso.is_empty());
    }
}
