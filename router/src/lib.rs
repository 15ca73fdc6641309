//! # Manole Router
//!
//! A deterministic, side-effect-free fallback (spec.md §4.6): when the
//! model's own tool choice is missing or empty, this maps the raw query
//! straight to a tool call by keyword. Never consults the model, never
//! has a failure mode — every query falls through to `semantic_search`
//! if nothing more specific matches.

mod extension;

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedTool {
    pub tool_name: String,
    pub params: Value,
}

impl RoutedTool {
    fn new(tool_name: &str, params: Value) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            params,
        }
    }
}

const SPACE_KEYWORDS: &[&str] = &["space", "biggest", "largest", "storage", "heavy", "disk usage"];
const OVERVIEW_KEYWORDS: &[&str] = &["total", "usage", "overview", "summary"];
const STRUCTURE_KEYWORDS: &[&str] = &["folder", "tree", "directory", "structure"];
const COUNT_KEYWORDS: &[&str] = &["how many", "count", "number of"];
const LIST_KEYWORDS: &[&str] = &["list", "show me", "which files", "what files"];
const ATTRIBUTE_KEYWORDS: &[&str] = &[
    "size", "age", "modified", "created", "how big", "how large", "how old",
];

/// `route(query, intent?) → (tool_name, params)`.
pub fn route(query: &str, intent: Option<&str>) -> RoutedTool {
    let lower = query.to_lowercase();

    if let Some(ext) = extension::detect(&lower) {
        if contains_any(&lower, COUNT_KEYWORDS) {
            return RoutedTool::new("count_files", json!({"extension": ext}));
        }
        if contains_any(&lower, LIST_KEYWORDS) {
            return RoutedTool::new(
                "list_files",
                json!({"extension": ext, "limit": 10, "sort_by": "date"}),
            );
        }
    }

    if intent == Some("metadata") || contains_any(&lower, SPACE_KEYWORDS) {
        return if contains_any(&lower, OVERVIEW_KEYWORDS) {
            RoutedTool::new("disk_usage", json!({}))
        } else {
            RoutedTool::new("folder_stats", json!({"sort_by": "size"}))
        };
    }

    if contains_any(&lower, STRUCTURE_KEYWORDS) {
        return RoutedTool::new("directory_tree", json!({}));
    }

    if contains_any(&lower, ATTRIBUTE_KEYWORDS) {
        let hint = file_name_hint(query).unwrap_or_default();
        return RoutedTool::new("file_metadata", json!({"name_hint": hint}));
    }

    RoutedTool::new("semantic_search", json!({"query": query}))
}

fn contains_any(lower_query: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| lower_query.contains(kw))
}

/// A filename-with-extension in the query, or the last non-stopword
/// token (spec.md §4.6 step 3).
fn file_name_hint(query: &str) -> Option<String> {
    query
        .split_whitespace()
        .find(|word| {
            let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '.');
            trimmed.contains('.') && trimmed.rsplit('.').next().map_or(false, |e| !e.is_empty())
        })
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '.').to_string())
        .or_else(|| manole_nlp::last_non_stopword_token(query))
}
