use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Small on-disk record of every data directory this process (or a
/// prior run of it) has `init`-ed, so `list_indexes` has "known
/// locations" to enumerate without scanning the whole filesystem
/// (spec.md §4.15). One JSON file, read-modify-write, not a database —
/// this process is single-writer.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Registry {
    data_dirs: BTreeSet<PathBuf>,
}

pub async fn record(registry_path: &Path, data_dir: &Path) -> anyhow::Result<()> {
    let mut registry = load(registry_path).await;
    if registry.data_dirs.insert(data_dir.to_path_buf()) {
        if let Some(parent) = registry_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&registry)?;
        tokio::fs::write(registry_path, json).await?;
    }
    Ok(())
}

/// Known data directories that still exist and still carry a
/// `.neurofind/index` directory.
pub async fn list_indexes(registry_path: &Path) -> Vec<PathBuf> {
    load(registry_path)
        .await
        .data_dirs
        .into_iter()
        .filter(|dir| dir.join(".neurofind").join("index").is_dir())
        .collect()
}

async fn load(registry_path: &Path) -> Registry {
    match tokio::fs::read_to_string(registry_path).await {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        Err(_) => Registry::default(),
    }
}
