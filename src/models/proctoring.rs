use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Retention cap for the raw event list; the counts map keeps the full
/// per-type totals regardless.
pub const MAX_RETAINED_EVENTS: usize = 4000;

/// An integrity signal observed in the candidate's browser and delivered in
/// a batched flush. `details` is free-form (key codes, window gaps, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProctoringEventInput {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub details: Option<JsonValue>,
}

/// Fold a batch of events into the stored proctoring document.
///
/// Counts increment per type alongside the append, and the event list keeps
/// only the most recent MAX_RETAINED_EVENTS entries. Events are stamped with
/// the server receive time, not a client-supplied one.
pub fn apply_events(
    proctoring: &JsonValue,
    batch: &[ProctoringEventInput],
    received_at: DateTime<Utc>,
) -> JsonValue {
    let mut counts = proctoring
        .get("counts")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    let mut events = proctoring
        .get("events")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    for event in batch {
        let current = counts
            .get(&event.event_type)
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        counts.insert(event.event_type.clone(), json!(current + 1));
        events.push(json!({
            "atIso": received_at.to_rfc3339(),
            "type": event.event_type,
            "details": event.details.clone().unwrap_or_else(|| json!({})),
        }));
    }

    if events.len() > MAX_RETAINED_EVENTS {
        events.drain(0..events.len() - MAX_RETAINED_EVENTS);
    }

    json!({ "counts": counts, "events": events })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(event_type: &str) -> ProctoringEventInput {
        ProctoringEventInput {
            event_type: event_type.to_string(),
            details: None,
        }
    }

    #[test]
    fn counts_increment_alongside_event_append() {
        let base = json!({"counts": {}, "events": []});
        let batch = vec![input("copy"), input("paste"), input("copy")];
        let next = apply_events(&base, &batch, Utc::now());

        assert_eq!(next["counts"]["copy"], 2);
        assert_eq!(next["counts"]["paste"], 1);
        assert_eq!(next["events"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn counts_accumulate_across_flushes() {
        let mut doc = json!({"counts": {}, "events": []});
        doc = apply_events(&doc, &[input("window_blur")], Utc::now());
        doc = apply_events(&doc, &[input("window_blur")], Utc::now());
        assert_eq!(doc["counts"]["window_blur"], 2);
    }

    #[test]
    fn event_list_is_capped_dropping_oldest() {
        let mut events = Vec::new();
        for i in 0..MAX_RETAINED_EVENTS {
            events.push(json!({"atIso": "x", "type": "heartbeat", "details": {"seq": i}}));
        }
        let base = json!({"counts": {"heartbeat": MAX_RETAINED_EVENTS}, "events": events});

        let next = apply_events(&base, &[input("copy")], Utc::now());
        let list = next["events"].as_array().unwrap();
        assert_eq!(list.len(), MAX_RETAINED_EVENTS);
        // Oldest entry dropped, newest appended.
        assert_eq!(list[0]["details"]["seq"], 1);
        assert_eq!(list.last().unwrap()["type"], "copy");
        // Counts still track the full totals.
        assert_eq!(next["counts"]["heartbeat"], MAX_RETAINED_EVENTS);
        assert_eq!(next["counts"]["copy"], 1);
    }

    #[test]
    fn tolerates_missing_or_malformed_document() {
        let next = apply_events(&JsonValue::Null, &[input("cut")], Utc::now());
        assert_eq!(next["counts"]["cut"], 1);
        assert_eq!(next["events"].as_array().unwrap().len(), 1);
    }
}
