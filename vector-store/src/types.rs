use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Passage metadata. `file_path` is the only field every passage is
/// expected to carry; the rest are populated when the producing
/// extractor knows them (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Metadata {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_file_type(mut self, ty: impl Into<String>) -> Self {
        self.file_type = Some(ty.into());
        self
    }

    /// Read a field by name, checking the typed slots first and falling
    /// back to the free-form `extra` map. Used by the metadata filter.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "file_path" => Some(self.file_path.clone()),
            "file_name" => self.file_name.clone(),
            "file_type" => self.file_type.clone(),
            "page_number" => self.page_number.map(|n| n.to_string()),
            "chunk_index" => self.chunk_index.map(|n| n.to_string()),
            other => self.extra.get(other).map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

/// A chunk of extracted text, persisted once per chunk during indexing.
/// Never mutated after creation; removed only on a full rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

/// A transient search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub text: String,
    pub score: f32,
    pub metadata: Metadata,
}
