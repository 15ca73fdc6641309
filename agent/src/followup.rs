use serde_json::json;
use std::collections::HashSet;

/// Python-orchestrated follow-up (spec.md §4.10.1): after the model
/// gives a direct response with no tool call, check whether every
/// keyword in the user's original query is covered by the tool results
/// gathered so far. If not, force exactly one more tool call — first
/// `grep_files`, then `semantic_search` — never both in the same run,
/// and never if the model itself already chose to call another tool
/// this step.
pub struct FollowUp {
    pub tool_name: &'static str,
    pub params: serde_json::Value,
}

pub fn next_tool_call(
    original_query: &str,
    tool_results_so_far: &str,
    used_tools: &HashSet<String>,
) -> Option<FollowUp> {
    let keywords = manole_nlp::extract_keywords(original_query);
    let missing = manole_nlp::missing_keywords(&keywords, tool_results_so_far);
    if missing.is_empty() {
        return None;
    }

    if !used_tools.contains("grep_files") {
        return Some(FollowUp {
            tool_name: "grep_files",
            params: json!({"pattern": missing[0]}),
        });
    }
    if !used_tools.contains("semantic_search") {
        return Some(FollowUp {
            tool_name: "semantic_search",
            params: json!({"query": missing.join(" ")}),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forces_grep_files_first_when_keyword_missing() {
        let used = HashSet::new();
        let follow = next_tool_call("any macbook pdfs", "Found 25 .pdf files.", &used).unwrap();
        assert_eq!(follow.tool_name, "grep_files");
        assert_eq!(follow.params["pattern"], "macbook");
    }

    #[test]
    fn falls_back_to_semantic_search_once_grep_already_used() {
        let mut used = HashSet::new();
        used.insert("grep_files".to_string());
        let follow = next_tool_call("any macbook pdfs", "Found 25 .pdf files.", &used).unwrap();
        assert_eq!(follow.tool_name, "semantic_search");
    }

    #[test]
    fn no_follow_up_once_both_tools_used() {
        let mut used = HashSet::new();
        used.insert("grep_files".to_string());
        used.insert("semantic_search".to_string());
        assert!(next_tool_call("any macbook pdfs", "Found 25 .pdf files.", &used).is_none());
    }

    #[test]
    fn no_follow_up_when_all_keywords_covered() {
        let used = HashSet::new();
        assert!(next_tool_call("macbook pdfs", "macbook_ssd.pdf matched", &used).is_none());
    }
}
