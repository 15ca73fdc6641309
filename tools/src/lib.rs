//! # Manole Tools
//!
//! `ToolRegistry` (spec.md §4.7): the one place that maps a tool name to
//! its handler and its schema. Every handler returns `(text, sources)`;
//! only `semantic_search` ever returns a non-empty `sources`. This is
//! also the authoritative list the agent enumerates in its system
//! prompt and the router picks tool names from.

mod schema;

pub use schema::{tool_defs, ToolDef};

use manole_searcher::Searcher;
use manole_toolbox::{SortBy, ToolBox};
use serde_json::Value;
use std::sync::Arc;

pub struct ToolRegistry {
    searcher: Arc<Searcher>,
    toolbox: Arc<ToolBox>,
}

impl ToolRegistry {
    pub fn new(searcher: Arc<Searcher>, toolbox: Arc<ToolBox>) -> Self {
        Self { searcher, toolbox }
    }

    pub fn tool_defs(&self) -> Vec<ToolDef> {
        schema::tool_defs()
    }

    /// Dispatch one tool call. Unknown tool names return
    /// `("Unknown tool: T", [])` rather than an error — the agent loop
    /// treats every step as recoverable.
    pub async fn dispatch(&self, tool_name: &str, params: &Value) -> (String, Vec<String>) {
        match tool_name {
            "semantic_search" => self.semantic_search(params).await,
            "count_files" => (self.count_files(params), Vec::new()),
            "list_files" => (self.list_files(params), Vec::new()),
            "file_metadata" => (self.file_metadata(params), Vec::new()),
            "grep_files" => (self.grep_files(params), Vec::new()),
            "directory_tree" => (self.directory_tree(params), Vec::new()),
            "folder_stats" => (self.folder_stats(params), Vec::new()),
            "disk_usage" => (self.toolbox.disk_usage(), Vec::new()),
            "respond" => (respond_answer(params), Vec::new()),
            other => (format!("Unknown tool: {other}"), Vec::new()),
        }
    }

    async fn semantic_search(&self, params: &Value) -> (String, Vec<String>) {
        let parsed: schema::SemanticSearchParams =
            serde_json::from_value(params.clone()).unwrap_or_default();
        let top_k = parsed.top_k.clamp(1, 10);
        match self.searcher.search_and_extract(&parsed.query, top_k).await {
            Ok(result) => result,
            Err(err) => {
                log::warn!("semantic_search failed: {err}");
                ("Search failed.".to_string(), Vec::new())
            }
        }
    }

    fn count_files(&self, params: &Value) -> String {
        let parsed: schema::CountFilesParams = serde_json::from_value(params.clone()).unwrap_or_default();
        self.toolbox.count_files(parsed.extension.as_deref(), None)
    }

    fn list_files(&self, params: &Value) -> String {
        let parsed: schema::ListFilesParams = serde_json::from_value(params.clone()).unwrap_or_default();
        self.toolbox.list_recent_files(
            parsed.extension.as_deref(),
            None,
            parsed.limit,
            SortBy::parse(&parsed.sort_by),
        )
    }

    fn file_metadata(&self, params: &Value) -> String {
        let parsed: schema::FileMetadataParams =
            serde_json::from_value(params.clone()).unwrap_or_default();
        self.toolbox.get_file_metadata(parsed.name_hint.as_deref())
    }

    fn grep_files(&self, params: &Value) -> String {
        let parsed: schema::GrepFilesParams = serde_json::from_value(params.clone()).unwrap_or_default();
        let matches = self.toolbox.grep(&parsed.pattern);
        if matches.is_empty() {
            "No matching files found.".to_string()
        } else {
            matches.join("\n")
        }
    }

    fn directory_tree(&self, params: &Value) -> String {
        let parsed: schema::DirectoryTreeParams =
            serde_json::from_value(params.clone()).unwrap_or_default();
        self.toolbox.tree(Some(parsed.max_depth))
    }

    fn folder_stats(&self, params: &Value) -> String {
        let parsed: schema::FolderStatsParams =
            serde_json::from_value(params.clone()).unwrap_or_default();
        self.toolbox.folder_stats(SortBy::parse(&parsed.sort_by), parsed.limit)
    }
}

fn respond_answer(params: &Value) -> String {
    let parsed: schema::RespondParams = serde_json::from_value(params.clone()).unwrap_or_default();
    parsed.answer
}
