use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub mtime: String,
    pub chunks: usize,
}

/// `<index_dir>/manifest.json` (spec.md §6): the diff basis for
/// incremental updates and the sole source of truth for which files are
/// already indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub files: HashMap<String, FileRecord>,
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            files: HashMap::new(),
        }
    }

    pub fn path(index_dir: &Path) -> PathBuf {
        index_dir.join("manifest.json")
    }

    pub fn exists(index_dir: &Path) -> bool {
        Self::path(index_dir).exists()
    }

    /// Manifest read failure is non-fatal (spec.md §4.13): the caller
    /// treats `None` as "behave like a full no-op", never as grounds to
    /// trigger a full rebuild.
    pub async fn load(index_dir: &Path) -> Option<Self> {
        let raw = tokio::fs::read_to_string(Self::path(index_dir)).await.ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub async fn save(&self, index_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(index_dir).await?;
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(Self::path(index_dir), json).await?;
        Ok(())
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::new();
        manifest.files.insert(
            "notes.txt".to_string(),
            FileRecord { mtime: "100".to_string(), chunks: 3 },
        );
        manifest.save(dir.path()).await.unwrap();

        let loaded = Manifest::load(dir.path()).await.unwrap();
        assert_eq!(loaded.files["notes.txt"].chunks, 3);
    }

    #[tokio::test]
    async fn missing_manifest_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Manifest::load(dir.path()).await.is_none());
    }
}
