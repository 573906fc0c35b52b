use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::models::assessment::Assessment;
use crate::models::proctoring::ProctoringEventInput;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoadRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    pub ok: bool,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[validate(length(min = 1))]
    pub token: String,
    pub answers_patch: JsonValue,
    pub current_step: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogEventsRequest {
    #[validate(length(min = 1))]
    pub token: String,
    pub events: Vec<ProctoringEventInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    #[validate(length(min = 1))]
    pub token: String,
    pub question_index: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub signed_url: String,
    pub storage_path: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommitVideoRequest {
    #[validate(length(min = 1))]
    pub token: String,
    pub question_index: i32,
    #[validate(length(min = 1))]
    pub storage_path: String,
    #[serde(default)]
    pub duration_sec: i64,
    #[serde(default)]
    pub size_bytes: i64,
    pub created_at_iso: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedeemVideoRequest {
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemVideoResponse {
    pub video_url: String,
    pub question_index: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_request_accepts_client_wire_format() {
        let req: SaveRequest = serde_json::from_value(json!({
            "token": "abc",
            "answersPatch": {"personality": {"honestyCommitment": true}},
            "currentStep": 2
        }))
        .unwrap();
        assert_eq!(req.current_step, Some(2));
        assert_eq!(req.answers_patch["personality"]["honestyCommitment"], true);
    }

    #[test]
    fn commit_request_defaults_optional_metrics() {
        let req: CommitVideoRequest = serde_json::from_value(json!({
            "token": "abc",
            "questionIndex": 3,
            "storagePath": "videos/a/q4-1.webm"
        }))
        .unwrap();
        assert_eq!(req.duration_sec, 0);
        assert_eq!(req.size_bytes, 0);
        assert!(req.created_at_iso.is_none());
    }
}
