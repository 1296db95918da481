//! Structural checks for a single JSON5 layer before it is merged.
//!
//! Serde alone would ignore unknown keys and report type errors without the
//! layer they came from, so each layer is checked against this table first.

use crate::ConfigError;
use serde_json::Value;

/// Accepted shape of a leaf value.
#[derive(Debug, Clone, Copy)]
enum Leaf {
    Text,
    NullableText,
    Count,
}

impl Leaf {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Leaf::Text => value.is_string(),
            Leaf::NullableText => value.is_string() || value.is_null(),
            Leaf::Count => value.is_u64(),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Leaf::Text => "expected string",
            Leaf::NullableText => "expected string or null",
            Leaf::Count => "expected non-negative integer",
        }
    }
}

const SECTIONS: &[(&str, &[(&str, Leaf)])] = &[
    (
        "storage",
        &[("root", Leaf::NullableText), ("backup_dir", Leaf::Text)],
    ),
    (
        "retry",
        &[("max_attempts", Leaf::Count), ("base_delay_ms", Leaf::Count)],
    ),
    ("search", &[("default_limit", Leaf::Count)]),
];

/// Check `value` against the vault config schema. `origin` names the layer
/// in error paths, e.g. `cwd(/work/ctxvault.json5):retry.max_attempts`.
pub(super) fn check_layer(value: &Value, origin: &str) -> Result<(), ConfigError> {
    let Value::Object(top) = value else {
        return Err(invalid(origin, "root", "expected object"));
    };
    for (key, section_value) in top {
        if key == "$schema" {
            if !section_value.is_string() {
                return Err(invalid(origin, key, Leaf::Text.expected()));
            }
            continue;
        }
        let Some((_, fields)) = SECTIONS.iter().find(|(name, _)| *name == key.as_str()) else {
            return Err(invalid(origin, key, "unknown key"));
        };
        let Value::Object(section) = section_value else {
            return Err(invalid(origin, key, "expected object"));
        };
        for (field, field_value) in section {
            let path = format!("{key}.{field}");
            let Some((_, leaf)) = fields.iter().find(|(name, _)| *name == field.as_str()) else {
                return Err(invalid(origin, &path, "unknown key"));
            };
            if !leaf.accepts(field_value) {
                return Err(invalid(origin, &path, leaf.expected()));
            }
        }
    }
    Ok(())
}

fn invalid(origin: &str, path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: format!("{origin}:{path}"),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::check_layer;
    use crate::ConfigError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field_error(value: serde_json::Value) -> (String, String) {
        match check_layer(&value, "test") {
            Err(ConfigError::InvalidField { path, message }) => (path, message),
            other => panic!("expected field error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_known_sections() {
        let layer = json!({
            "$schema": "https://example.invalid/ctxvault.json",
            "storage": { "root": null, "backup_dir": ".bk" },
            "retry": { "max_attempts": 2 },
            "search": {},
        });
        assert!(check_layer(&layer, "test").is_ok());
    }

    #[test]
    fn reports_layer_and_dotted_path() {
        let (path, message) = field_error(json!({ "retry": { "base_delay_ms": -1 } }));
        assert_eq!(path, "test:retry.base_delay_ms");
        assert_eq!(message, "expected non-negative integer");

        let (path, message) = field_error(json!({ "search": { "fuzzy": true } }));
        assert_eq!(path, "test:search.fuzzy");
        assert_eq!(message, "unknown key");

        let (path, _) = field_error(json!({ "storage": "here" }));
        assert_eq!(path, "test:storage");

        let (path, _) = field_error(json!([1]));
        assert_eq!(path, "test:root");
    }
}
