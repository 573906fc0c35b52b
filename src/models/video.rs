use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Interview has exactly five question slots, indexed 0..=4.
pub const MAX_QUESTION_INDEX: i32 = 4;
pub const QUESTION_COUNT: usize = 5;

/// Committed recording metadata, stored under `answers.video.recordings`.
/// The JSON field names are the client wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecording {
    pub question_index: i32,
    pub storage_path: String,
    #[serde(default)]
    pub duration_sec: i64,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default)]
    pub created_at_iso: String,
}

pub fn clamp_question_index(index: i32) -> i32 {
    index.clamp(0, MAX_QUESTION_INDEX)
}

/// Recordings currently stored in an answers document. Entries that fail to
/// deserialize are skipped rather than failing the whole read.
pub fn recordings_from_answers(answers: &JsonValue) -> Vec<VideoRecording> {
    answers
        .pointer("/video/recordings")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Create-or-replace the recording entry for one question index.
///
/// Filter-then-push: a re-commit for an index drops the prior entry for that
/// index and leaves every other slot untouched, so the list never holds more
/// than one recording per index.
pub fn upsert_recording(answers: &JsonValue, recording: VideoRecording) -> JsonValue {
    let mut next: Vec<JsonValue> = recordings_from_answers(answers)
        .into_iter()
        .filter(|r| r.question_index != recording.question_index)
        .map(|r| serde_json::to_value(r).unwrap_or(JsonValue::Null))
        .collect();
    next.push(serde_json::to_value(&recording).unwrap_or(JsonValue::Null));

    let mut out = match answers {
        JsonValue::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    let mut video = match out.get("video") {
        Some(JsonValue::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };
    video.insert("recordings".to_string(), json!(next));
    out.insert("video".to_string(), JsonValue::Object(video));
    JsonValue::Object(out)
}
