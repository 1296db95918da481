//! Layer merging: objects merge key by key, anything else is replaced.

use serde_json::Value;

/// Fold `overlay` into `base`; keys present in `overlay` win.
pub(super) fn overlay(base: &mut Value, overlay_value: Value) {
    match (base, overlay_value) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::overlay;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_sections_merge_and_scalars_override() {
        let mut base = json!({ "retry": { "max_attempts": 3, "base_delay_ms": 100 } });
        overlay(&mut base, json!({ "retry": { "max_attempts": 5 } }));
        assert_eq!(
            base,
            json!({ "retry": { "max_attempts": 5, "base_delay_ms": 100 } })
        );
    }

    #[test]
    fn explicit_null_clears_root() {
        let mut base = json!({ "storage": { "root": "/data" } });
        overlay(&mut base, json!({ "storage": { "root": null } }));
        assert_eq!(base, json!({ "storage": { "root": null } }));
    }
}
