use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_SUBMITTED: &str = "submitted";

/// One candidate's application record, keyed by a shareable token.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: Uuid,
    pub token: String,
    pub admin_label: Option<String>,
    pub status: String,
    pub current_step: i32,
    pub answers: JsonValue,
    pub proctoring: JsonValue,
    pub ai_evaluations: JsonValue,
    pub video_behavior: Option<JsonValue>,
    pub created_by_trainer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Assessment {
    /// Submitted is terminal: all mutating operations must be rejected.
    pub fn is_submitted(&self) -> bool {
        self.status == STATUS_SUBMITTED
    }
}
