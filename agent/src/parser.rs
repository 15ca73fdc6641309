use crate::prompts::{TOOL_CALL_END, TOOL_CALL_START};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub params: Value,
}

/// Parse a tool call out of a model response. Two accepted forms
/// (spec.md §4.10 step 2): the sentinel-delimited native form, or a bare
/// JSON object with `name` and `params`/`parameters`. An unknown tool
/// name is treated as no tool call at all.
pub fn parse_tool_call(text: &str, known_tools: &[&str]) -> Option<ToolCall> {
    let call = parse_native(text).or_else(|| parse_json_form(text))?;
    known_tools.contains(&call.name.as_str()).then_some(call)
}

fn parse_native(text: &str) -> Option<ToolCall> {
    let start = text.find(TOOL_CALL_START)? + TOOL_CALL_START.len();
    let end = text[start..].find(TOOL_CALL_END)? + start;
    let body = text[start..end].trim();

    let open = body.find('(')?;
    let name = body[..open].trim().to_string();
    let close = body.rfind(')')?;
    if close < open {
        return None;
    }
    let args_str = &body[open + 1..close];

    let mut params = Map::new();
    for arg in split_top_level(args_str) {
        let arg = arg.trim();
        if arg.is_empty() {
            continue;
        }
        let (key, value) = arg.split_once('=')?;
        params.insert(key.trim().to_string(), parse_literal(value.trim()));
    }

    Some(ToolCall {
        name,
        params: Value::Object(params),
    })
}

fn split_top_level(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

fn parse_literal(raw: &str) -> Value {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        return Value::String(inner.replace("\\\"", "\"").replace("\\\\", "\\"));
    }
    match raw {
        "None" => return Value::Null,
        "True" => return Value::Bool(true),
        "False" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

fn parse_json_form(text: &str) -> Option<ToolCall> {
    let value = manole_jsonx::parse_json(text)?;
    let name = value.get("name")?.as_str()?.to_string();
    let params = value
        .get("params")
        .or_else(|| value.get("parameters"))
        .cloned()
        .unwrap_or(Value::Object(Map::new()));
    Some(ToolCall { name, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KNOWN: &[&str] = &["count_files", "semantic_search", "respond"];

    #[test]
    fn parses_native_sentinel_form_with_mixed_literals() {
        let text = format!(
            "Let me check.\n{TOOL_CALL_START}count_files(extension=\"pdf\", limit=5, recursive=True, time=None){TOOL_CALL_END}"
        );
        let call = parse_tool_call(&text, KNOWN).unwrap();
        assert_eq!(call.name, "count_files");
        assert_eq!(call.params["extension"], json!("pdf"));
        assert_eq!(call.params["limit"], json!(5));
        assert_eq!(call.params["recursive"], json!(true));
        assert_eq!(call.params["time"], json!(null));
    }

    #[test]
    fn parses_json_object_form() {
        let text = r#"{"name": "semantic_search", "params": {"query": "budget", "top_k": 3}}"#;
        let call = parse_tool_call(text, KNOWN).unwrap();
        assert_eq!(call.name, "semantic_search");
        assert_eq!(call.params["query"], json!("budget"));
    }

    #[test]
    fn accepts_parameters_key_as_alias_for_params() {
        let text = r#"{"name": "respond", "parameters": {"answer": "done"}}"#;
        let call = parse_tool_call(text, KNOWN).unwrap();
        assert_eq!(call.params["answer"], json!("done"));
    }

    #[test]
    fn unknown_tool_name_is_treated_as_no_tool_call() {
        let text = format!("{TOOL_CALL_START}delete_everything(){TOOL_CALL_END}");
        assert!(parse_tool_call(&text, KNOWN).is_none());
    }

    #[test]
    fn plain_prose_has_no_tool_call() {
        assert!(parse_tool_call("I think the answer is 42.", KNOWN).is_none());
    }
}
