use serde_json::Value as JsonValue;

/// Merge a partial answers patch into the stored document.
///
/// Objects merge recursively key-by-key; arrays, scalars and nulls replace
/// the stored value wholesale. The client always sends a field's intended
/// final value, so no element-wise list reconciliation happens here.
pub fn deep_merge(base: &JsonValue, patch: &JsonValue) -> JsonValue {
    match (base, patch) {
        (JsonValue::Object(base_map), JsonValue::Object(patch_map)) => {
            let mut out = base_map.clone();
            for (key, patch_value) in patch_map {
                let merged = match base_map.get(key) {
                    Some(existing) => deep_merge(existing, patch_value),
                    None => patch_value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            JsonValue::Object(out)
        }
        _ => patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_without_clobbering_siblings() {
        let base = json!({"a": {"x": 0, "y": 2}});
        let patch = json!({"a": {"x": 1}});
        assert_eq!(deep_merge(&base, &patch), json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn sibling_sections_are_preserved() {
        let base = json!({
            "personality": {"hobbies": "chess"},
            "aiUsage": {"knownChatbots": "several"}
        });
        let patch = json!({"personality": {"honestyCommitment": true}});
        let merged = deep_merge(&base, &patch);
        assert_eq!(merged["personality"]["hobbies"], "chess");
        assert_eq!(merged["personality"]["honestyCommitment"], true);
        assert_eq!(merged["aiUsage"]["knownChatbots"], "several");
    }

    #[test]
    fn arrays_replace_wholesale_never_concatenate() {
        let base = json!({"video": {"recordings": [{"questionIndex": 0}, {"questionIndex": 1}]}});
        let patch = json!({"video": {"recordings": [{"questionIndex": 2}]}});
        let merged = deep_merge(&base, &patch);
        assert_eq!(
            merged["video"]["recordings"],
            json!([{"questionIndex": 2}])
        );
    }

    #[test]
    fn scalars_and_nulls_replace() {
        let base = json!({"a": {"b": 1}});
        assert_eq!(deep_merge(&base, &json!({"a": 5})), json!({"a": 5}));
        assert_eq!(deep_merge(&base, &json!({"a": null})), json!({"a": null}));
        assert_eq!(deep_merge(&json!(null), &json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn keys_absent_from_the_patch_survive() {
        let base = json!({"a": 1, "b": {"c": 2}});
        let patch = json!({"b": {"d": 3}});
        assert_eq!(
            deep_merge(&base, &patch),
            json!({"a": 1, "b": {"c": 2, "d": 3}})
        );
    }
}
