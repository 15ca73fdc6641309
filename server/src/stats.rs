use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Deterministic snapshot of a data directory, collected once on
/// `init` and re-collected on `reindex` (spec.md §4.15). Grounded on
/// the same `ignore`-based walk `manole-toolbox` uses, kept as its own
/// small pass here since the shape (grouped by extension, top-N
/// largest) doesn't match any single `ToolBox` op.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TypeStats {
    pub count: usize,
    pub total_size: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct LargestFile {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DirectoryStats {
    pub file_count: usize,
    pub directory_count: usize,
    pub max_depth: usize,
    pub avg_file_size: f64,
    pub by_type: HashMap<String, TypeStats>,
    pub top_largest: Vec<LargestFile>,
}

pub fn collect(root: &Path) -> DirectoryStats {
    let mut file_count = 0usize;
    let mut total_size = 0u64;
    let mut by_type: HashMap<String, TypeStats> = HashMap::new();
    let mut largest: Vec<LargestFile> = Vec::new();
    let mut directory_count = 0usize;
    let mut max_depth = 0usize;

    for entry in WalkBuilder::new(root).hidden(true).build() {
        let Ok(entry) = entry else { continue };
        let depth = entry.depth();
        let Some(file_type) = entry.file_type() else { continue };

        if file_type.is_dir() {
            if depth > 0 {
                directory_count += 1;
            }
            max_depth = max_depth.max(depth);
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let Ok(metadata) = entry.metadata() else { continue };
        let size = metadata.len();
        let relpath = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .to_string();
        let ext = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "(none)".to_string());

        file_count += 1;
        total_size += size;
        max_depth = max_depth.max(depth);

        let entry_stats = by_type.entry(ext).or_default();
        entry_stats.count += 1;
        entry_stats.total_size += size;

        largest.push(LargestFile { path: relpath, size });
    }

    largest.sort_by(|a, b| b.size.cmp(&a.size));
    largest.truncate(3);

    let avg_file_size = if file_count > 0 {
        total_size as f64 / file_count as f64
    } else {
        0.0
    };

    DirectoryStats {
        file_count,
        directory_count,
        max_depth,
        avg_file_size,
        by_type,
        top_largest: largest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_files_and_finds_the_largest() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.txt"), "x".repeat(10)).await.unwrap();
        tokio::fs::write(dir.path().join("b.txt"), "x".repeat(100)).await.unwrap();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();
        tokio::fs::write(dir.path().join("sub").join("c.pdf"), "x".repeat(5)).await.unwrap();

        let stats = collect(dir.path());
        assert_eq!(stats.file_count, 3);
        assert_eq!(stats.directory_count, 1);
        assert_eq!(stats.top_largest[0].path, "b.txt");
        assert_eq!(stats.by_type.get("txt").unwrap().count, 2);
        assert_eq!(stats.by_type.get("pdf").unwrap().count, 1);
    }

    #[tokio::test]
    async fn empty_directory_has_zero_average_size() {
        let dir = tempfile::tempdir().unwrap();
        let stats = collect(dir.path());
        assert_eq!(stats.file_count, 0);
        assert_eq!(stats.avg_file_size, 0.0);
    }
}
