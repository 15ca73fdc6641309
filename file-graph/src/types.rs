use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileNode {
    pub id: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Similarity,
    Reference,
    Structure,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct FileGraph {
    pub nodes: Vec<FileNode>,
    pub edges: Vec<FileEdge>,
}
