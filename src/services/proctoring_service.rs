use chrono::Utc;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::proctoring::{apply_events, ProctoringEventInput};
use crate::services::assessment_service::AssessmentService;

#[derive(Clone)]
pub struct ProctoringService {
    pool: PgPool,
}

impl ProctoringService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fold a flushed batch of client integrity signals into the stored
    /// proctoring document. Counts increment per type; the raw event list is
    /// bounded. Delivery is best-effort from the candidate's side, so this
    /// intentionally accepts events regardless of assessment status.
    pub async fn log_events(
        &self,
        token: &str,
        events: &[ProctoringEventInput],
    ) -> Result<()> {
        let assessments = AssessmentService::new(self.pool.clone());
        let existing = assessments.get_by_token(token).await?;

        let next = apply_events(&existing.proctoring, events, Utc::now());

        sqlx::query(
            r#"UPDATE candidate_assessments SET proctoring = $1, updated_at = NOW() WHERE token = $2"#,
        )
        .bind(&next)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
