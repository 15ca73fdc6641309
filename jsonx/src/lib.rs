//! Three-tier JSON salvage, for parsing a small model's free-form JSON
//! output (spec.md §9: "Dynamic JSON shapes"). Tier 1 is a strict
//! parse; tier 2 narrows to the outermost `{...}` substring before
//! parsing; tier 3 salvages `"key": value` pairs with a regex when
//! neither of those produces valid JSON. All three return the same
//! `serde_json::Value::Object` shape so callers never need to know
//! which tier fired.

use regex::Regex;
use serde_json::{Map, Value};

/// Parse `s`, the text completion from a model call, as a JSON object.
/// Returns `None` if nothing — not even a regex salvage — looks like an
/// object. Callers must treat `None` as a negative signal (irrelevant
/// chunk, identity rewrite, no tool call), never as a retryable error.
pub fn parse_json(s: &str) -> Option<Value> {
    let trimmed = s.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }

    salvage(trimmed)
}

/// `parse_json` is idempotent on well-formed objects: re-serializing and
/// re-parsing a plain object of scalars returns the same value
/// (spec.md §8, P6).
fn salvage(s: &str) -> Option<Value> {
    let pair_re = Regex::new(
        r#""(?P<key>[A-Za-z_][A-Za-z0-9_]*)"\s*:\s*(?P<value>"(?:[^"\\]|\\.)*"|true|false|null|-?\d+(?:\.\d+)?|\[[^\]]*\])"#,
    )
    .ok()?;

    let mut object = Map::new();
    for capture in pair_re.captures_iter(s) {
        let key = capture.name("key")?.as_str().to_string();
        let raw_value = capture.name("value")?.as_str();
        let value = serde_json::from_str::<Value>(raw_value).unwrap_or(Value::Null);
        object.insert(key, value);
    }

    if object.is_empty() {
        None
    } else {
        Some(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_parse_roundtrips_scalars() {
        let original = json!({"relevant": true, "facts": ["a", "b"]});
        let text = serde_json::to_string(&original).unwrap();
        assert_eq!(parse_json(&text), Some(original));
    }

    #[test]
    fn narrows_to_outermost_braces_with_preamble() {
        let text = r#"Sure, here is the answer: {"relevant": false, "facts": []} -- done"#;
        let value = parse_json(text).unwrap();
        assert_eq!(value["relevant"], json!(false));
    }

    #[test]
    fn salvages_unterminated_json() {
        let text = r#"{"intent": "factual", "search_query": "budget report"#;
        let value = parse_json(text).unwrap();
        assert_eq!(value["intent"], json!("factual"));
        assert_eq!(value["search_query"], json!("budget report"));
    }

    #[test]
    fn returns_none_for_unparseable_garbage() {
        assert_eq!(parse_json("not json at all"), None);
    }
}
