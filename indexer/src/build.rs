use crate::error::Result;
use crate::manifest::{FileRecord, Manifest};
use crate::scan::{self, scan_files};
use manole_extractor::Extractor;
use manole_vector_store::{Metadata, VectorIndex};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Counts returned by a build/update so the caller (the `Server`, per
/// spec.md §4.15) can report progress and populate directory stats.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub files_indexed: usize,
    pub chunks_indexed: usize,
    pub files_skipped_errors: usize,
}

/// Builds and maintains one index for one data directory: full build,
/// incremental update, and single-file append (spec.md §4.13).
pub struct KreuzbergIndexer {
    data_dir: PathBuf,
    index_dir: PathBuf,
    index: Arc<dyn VectorIndex>,
    extractor: Arc<dyn Extractor>,
}

impl KreuzbergIndexer {
    pub fn new(
        data_dir: impl AsRef<Path>,
        index_dir: impl AsRef<Path>,
        index: Arc<dyn VectorIndex>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            index_dir: index_dir.as_ref().to_path_buf(),
            index,
            extractor,
        }
    }

    /// `build(data_dir, index_name, force)` (spec.md §4.13). `index_name`
    /// is implicit in `self.index_dir`, resolved by the caller.
    pub async fn build(&self, force: bool) -> Result<BuildStats> {
        if !force && !self.index.passages().is_empty() {
            if Manifest::exists(&self.index_dir) {
                return self.incremental_update().await;
            }
            log::warn!(
                "index at {:?} already has data but no manifest; skipping full build",
                self.index_dir
            );
            return Ok(BuildStats::default());
        }

        let files = scan_files(&self.data_dir);
        let mut manifest = Manifest::new();
        let mut stats = BuildStats::default();

        for path in files {
            let relpath = scan::relative_path(&self.data_dir, &path);
            let mtime = match scan::mtime_string(&path).await {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("could not stat {path:?}: {e}");
                    stats.files_skipped_errors += 1;
                    continue;
                }
            };

            match self.index_one_file(&path, &relpath).await {
                Ok(chunk_count) => {
                    manifest.files.insert(relpath, FileRecord { mtime, chunks: chunk_count });
                    stats.files_indexed += 1;
                    stats.chunks_indexed += chunk_count;
                }
                Err(e) => {
                    log::warn!("failed to extract {path:?}: {e}");
                    stats.files_skipped_errors += 1;
                }
            }
        }

        self.index.finalize().await?;
        manifest.save(&self.index_dir).await?;
        Ok(stats)
    }

    /// `incremental_update(data_dir, index_path)` (spec.md §4.13).
    pub async fn incremental_update(&self) -> Result<BuildStats> {
        let Some(mut manifest) = Manifest::load(&self.index_dir).await else {
            log::warn!("manifest unreadable at {:?}; treating update as a no-op", self.index_dir);
            return Ok(BuildStats::default());
        };

        let mut stats = BuildStats::default();
        for path in scan_files(&self.data_dir) {
            let relpath = scan::relative_path(&self.data_dir, &path);
            let mtime = match scan::mtime_string(&path).await {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("could not stat {path:?}: {e}");
                    stats.files_skipped_errors += 1;
                    continue;
                }
            };

            let changed = manifest
                .files
                .get(&relpath)
                .map(|record| record.mtime != mtime)
                .unwrap_or(true);
            if !changed {
                continue;
            }

            match self.index_one_file(&path, &relpath).await {
                Ok(chunk_count) => {
                    manifest.files.insert(relpath, FileRecord { mtime, chunks: chunk_count });
                    stats.files_indexed += 1;
                    stats.chunks_indexed += chunk_count;
                }
                Err(e) => {
                    log::warn!("failed to extract {path:?}: {e}");
                    stats.files_skipped_errors += 1;
                }
            }
        }

        if stats.files_indexed > 0 {
            manifest.save(&self.index_dir).await?;
        }
        Ok(stats)
    }

    /// `extract_and_append_file(path, data_dir, index_path)` — invoked
    /// by the watcher when a single file changes.
    pub async fn extract_and_append_file(&self, path: &Path) -> Result<()> {
        if scan::is_skipped(path) {
            return Ok(());
        }
        let relpath = scan::relative_path(&self.data_dir, path);
        let mtime = scan::mtime_string(path).await?;

        let mut manifest = Manifest::load(&self.index_dir).await.unwrap_or_default();
        match self.index_one_file(path, &relpath).await {
            Ok(chunk_count) => {
                manifest.files.insert(relpath, FileRecord { mtime, chunks: chunk_count });
                manifest.save(&self.index_dir).await?;
                Ok(())
            }
            Err(e) => {
                log::warn!("failed to extract {path:?}: {e}");
                Ok(())
            }
        }
    }

    /// Extracts one file and appends its chunks to the index. Returns
    /// the number of chunks produced (0 for an empty or unsupported
    /// file — extraction failure is the caller's concern, not this
    /// helper's, since full build and incremental update disagree on
    /// whether it's an error to record).
    async fn index_one_file(&self, path: &Path, relpath: &str) -> Result<usize> {
        let doc = self.extractor.extract_file(path).await?;
        if doc.chunks.is_empty() {
            return Ok(0);
        }

        let file_name = path.file_name().map(|n| n.to_string_lossy().to_string());
        let file_type = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        let mut records = Vec::with_capacity(doc.chunks.len());
        for chunk in &doc.chunks {
            let mut metadata = Metadata::new(relpath.to_string());
            if let Some(name) = &file_name {
                metadata = metadata.with_file_name(name.clone());
            }
            if let Some(ty) = &file_type {
                metadata = metadata.with_file_type(ty.clone());
            }
            metadata.page_number = chunk.page_number;
            metadata.chunk_index = Some(chunk.chunk_index);
            if let Some(element_type) = &chunk.element_type {
                metadata
                    .extra
                    .insert("element_type".to_string(), Value::String(element_type.clone()));
            }
            records.push((chunk.text.clone(), metadata));
        }

        let count = records.len();
        self.index.append(records).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manole_extractor::PlainTextExtractor;
    use manole_vector_store::InMemoryVectorIndex;

    fn indexer(data_dir: &Path, index_dir: &Path) -> KreuzbergIndexer {
        KreuzbergIndexer::new(
            data_dir,
            index_dir,
            Arc::new(InMemoryVectorIndex::with_hash_embedder()),
            Arc::new(PlainTextExtractor::new()),
        )
    }

    #[tokio::test]
    async fn full_build_indexes_every_text_file_and_writes_a_manifest() {
        let data_dir = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(data_dir.path().join("notes.txt"), b"hello world").await.unwrap();
        tokio::fs::write(data_dir.path().join("photo.jpg"), b"binary").await.unwrap();

        let idx = indexer(data_dir.path(), index_dir.path());
        let stats = idx.build(false).await.unwrap();

        assert_eq!(stats.files_indexed, 1);
        assert!(Manifest::exists(index_dir.path()));
    }

    #[tokio::test]
    async fn incremental_update_only_reindexes_changed_files() {
        let data_dir = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(data_dir.path().join("a.txt"), b"first").await.unwrap();

        let idx = indexer(data_dir.path(), index_dir.path());
        idx.build(false).await.unwrap();

        let stats = idx.incremental_update().await.unwrap();
        assert_eq!(stats.files_indexed, 0);

        tokio::fs::write(data_dir.path().join("b.txt"), b"second").await.unwrap();
        let stats = idx.incremental_update().await.unwrap();
        assert_eq!(stats.files_indexed, 1);
    }

    #[tokio::test]
    async fn missing_manifest_makes_incremental_update_a_no_op() {
        let data_dir = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(data_dir.path().join("a.txt"), b"first").await.unwrap();

        let idx = indexer(data_dir.path(), index_dir.path());
        let stats = idx.incremental_update().await.unwrap();
        assert_eq!(stats.files_indexed, 0);
    }

    #[tokio::test]
    async fn single_file_append_updates_the_manifest() {
        let data_dir = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        let idx = indexer(data_dir.path(), index_dir.path());
        idx.build(false).await.unwrap();

        let path = data_dir.path().join("new.txt");
        tokio::fs::write(&path, b"fresh content").await.unwrap();
        idx.extract_and_append_file(&path).await.unwrap();

        let manifest = Manifest::load(index_dir.path()).await.unwrap();
        assert!(manifest.files.contains_key("new.txt"));
    }
}
