use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_MAX_DEPTH: usize = 2;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_sort_by() -> String {
    "date".to_string()
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SemanticSearchParams {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CountFilesParams {
    pub extension: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListFilesParams {
    pub extension: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct FileMetadataParams {
    pub name_hint: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GrepFilesParams {
    pub pattern: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct DirectoryTreeParams {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct FolderStatsParams {
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct DiskUsageParams {}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct RespondParams {
    pub answer: String,
}

/// One entry per defined tool (spec.md §4.7), for the agent's system
/// prompt and for model-facing tool descriptions.
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "semantic_search",
            description: "Search indexed file content by meaning and extract the facts that answer the question.",
            parameters: schema_value::<SemanticSearchParams>(),
        },
        ToolDef {
            name: "count_files",
            description: "Count files, optionally filtered by extension.",
            parameters: schema_value::<CountFilesParams>(),
        },
        ToolDef {
            name: "list_files",
            description: "List files, optionally filtered by extension, sorted by date, size, or name.",
            parameters: schema_value::<ListFilesParams>(),
        },
        ToolDef {
            name: "file_metadata",
            description: "Look up size and modified time for files whose name contains a hint.",
            parameters: schema_value::<FileMetadataParams>(),
        },
        ToolDef {
            name: "grep_files",
            description: "Find file paths whose name matches a pattern.",
            parameters: schema_value::<GrepFilesParams>(),
        },
        ToolDef {
            name: "directory_tree",
            description: "Render an ASCII tree of the data directory.",
            parameters: schema_value::<DirectoryTreeParams>(),
        },
        ToolDef {
            name: "folder_stats",
            description: "Per-folder file counts and sizes.",
            parameters: schema_value::<FolderStatsParams>(),
        },
        ToolDef {
            name: "disk_usage",
            description: "Total and average file size, and the largest extensions by size.",
            parameters: schema_value::<DiskUsageParams>(),
        },
        ToolDef {
            name: "respond",
            description: "Give the final answer to the user and stop reasoning. Always call this to finish.",
            parameters: schema_value::<RespondParams>(),
        },
    ]
}

fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null)
}
