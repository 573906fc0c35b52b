use serde_json::Value as JsonValue;

use crate::models::video::{recordings_from_answers, QUESTION_COUNT};

/// The five-step application wizard. Steps are linear; backward navigation
/// is always allowed, forward navigation is gated on the steps being left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Personality,
    AiUsage,
    DomainSelection,
    DomainKnowledge,
    Video,
}

impl Step {
    pub const FIRST: i32 = 1;
    pub const LAST: i32 = 5;

    pub fn from_number(n: i32) -> Option<Step> {
        match n {
            1 => Some(Step::Personality),
            2 => Some(Step::AiUsage),
            3 => Some(Step::DomainSelection),
            4 => Some(Step::DomainKnowledge),
            5 => Some(Step::Video),
            _ => None,
        }
    }

    pub fn number(self) -> i32 {
        match self {
            Step::Personality => 1,
            Step::AiUsage => 2,
            Step::DomainSelection => 3,
            Step::DomainKnowledge => 4,
            Step::Video => 5,
        }
    }

    /// Whether the answers document satisfies this step's completion
    /// predicate, i.e. the candidate may move past it.
    pub fn is_complete(self, answers: &JsonValue) -> bool {
        match self {
            Step::Personality => {
                hobbies_present(answers.pointer("/personality/hobbies"))
                    && answers
                        .pointer("/personality/dailyAvailability")
                        .map(|v| !v.is_null())
                        .unwrap_or(false)
                    && non_blank_string(answers.pointer("/personality/pressureNotes"))
                    && answers
                        .pointer("/personality/honestyCommitment")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false)
            }
            // Free-text prompts; the flow never hard-blocks on them.
            Step::AiUsage | Step::DomainKnowledge => true,
            Step::DomainSelection => non_blank_string(answers.pointer("/domain/selectedRoleId")),
            Step::Video => {
                let recordings = recordings_from_answers(answers);
                let mut seen = [false; QUESTION_COUNT];
                for r in &recordings {
                    if (0..QUESTION_COUNT as i32).contains(&r.question_index) {
                        seen[r.question_index as usize] = true;
                    }
                }
                seen.iter().all(|&s| s)
            }
        }
    }
}

/// Validate a move from the persisted step to a requested step. Moving
/// backward (or staying) is always fine; moving forward requires every step
/// being left behind to be complete.
pub fn can_move_to(current: i32, requested: i32, answers: &JsonValue) -> bool {
    if !(Step::FIRST..=Step::LAST).contains(&requested) {
        return false;
    }
    if requested <= current {
        return true;
    }
    (current..requested)
        .filter_map(Step::from_number)
        .all(|step| step.is_complete(answers))
}

/// Submission requires the whole flow to be complete.
pub fn ready_to_submit(answers: &JsonValue) -> bool {
    (Step::FIRST..=Step::LAST)
        .filter_map(Step::from_number)
        .all(|step| step.is_complete(answers))
}

/// Hobbies predate the array format, so both a non-blank string and a
/// non-empty list count.
fn hobbies_present(value: Option<&JsonValue>) -> bool {
    match value {
        Some(JsonValue::String(s)) => !s.trim().is_empty(),
        Some(JsonValue::Array(items)) => !items.is_empty(),
        _ => false,
    }
}

fn non_blank_string(value: Option<&JsonValue>) -> bool {
    value
        .and_then(|v| v.as_str())
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_personality() -> JsonValue {
        json!({
            "personality": {
                "hobbies": "chess, hiking",
                "dailyAvailability": "2-4h",
                "pressureNotes": "I slow down and plan",
                "honestyCommitment": true
            }
        })
    }

    #[test]
    fn step1_requires_all_four_fields() {
        let answers = complete_personality();
        assert!(Step::Personality.is_complete(&answers));

        for (path, empty) in [
            ("/personality/hobbies", json!("")),
            ("/personality/dailyAvailability", json!(null)),
            ("/personality/pressureNotes", json!("   ")),
            ("/personality/honestyCommitment", json!(false)),
        ] {
            let mut broken = complete_personality();
            let field = path.rsplit('/').next().unwrap();
            broken["personality"][field] = empty;
            assert!(
                !Step::Personality.is_complete(&broken),
                "expected incomplete when {} is blank",
                path
            );
        }
    }

    #[test]
    fn step1_accepts_array_hobbies_and_structured_availability() {
        let answers = json!({
            "personality": {
                "hobbies": ["chess"],
                "dailyAvailability": {"timezone": "EST", "schedule": []},
                "pressureNotes": "fine",
                "honestyCommitment": true
            }
        });
        assert!(Step::Personality.is_complete(&answers));
    }

    #[test]
    fn step3_requires_a_selected_role() {
        assert!(!Step::DomainSelection.is_complete(&json!({})));
        assert!(Step::DomainSelection.is_complete(&json!({
            "domain": {"selectedRoleId": "ai_ml"}
        })));
    }

    #[test]
    fn step5_requires_all_five_recording_slots() {
        let recordings: Vec<JsonValue> = (0..4)
            .map(|i| json!({"questionIndex": i, "storagePath": format!("videos/a/q{}.webm", i)}))
            .collect();
        let four = json!({"video": {"recordings": recordings}});
        assert!(!Step::Video.is_complete(&four));

        let recordings: Vec<JsonValue> = (0..5)
            .map(|i| json!({"questionIndex": i, "storagePath": format!("videos/a/q{}.webm", i)}))
            .collect();
        let five = json!({"video": {"recordings": recordings}});
        assert!(Step::Video.is_complete(&five));
    }

    #[test]
    fn duplicate_indices_do_not_satisfy_step5() {
        let recordings: Vec<JsonValue> = (0..5)
            .map(|_| json!({"questionIndex": 2, "storagePath": "videos/a/q3.webm"}))
            .collect();
        let answers = json!({"video": {"recordings": recordings}});
        assert!(!Step::Video.is_complete(&answers));
    }

    #[test]
    fn backward_moves_are_always_allowed() {
        assert!(can_move_to(4, 2, &json!({})));
        assert!(can_move_to(3, 3, &json!({})));
    }

    #[test]
    fn forward_moves_are_gated_on_every_step_left_behind() {
        let answers = complete_personality();
        assert!(can_move_to(1, 2, &answers));
        // Step 3 gate (role selection) blocks the jump to 4.
        assert!(!can_move_to(1, 4, &answers));
        assert!(!can_move_to(1, 2, &json!({})));
        assert!(!can_move_to(1, 6, &answers));
        assert!(!can_move_to(1, 0, &answers));
    }
}
