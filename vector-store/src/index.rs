use crate::embedder::{cosine, Embedder, HashEmbedder};
use crate::error::VectorStoreError;
use crate::filter::MetadataFilters;
use crate::types::{Metadata, Passage, SearchResult};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The `VectorIndex` port (spec.md §4.3): build, append, k-NN search,
/// plus the two accessors `FileGraph` needs (raw passages, query
/// embedding).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Add one record during a full build. Sequential; finalize once
    /// done.
    async fn add(&self, text: String, metadata: Metadata) -> Result<()>;

    /// Finalize a build (no-op for implementations with no separate
    /// index-assembly step).
    async fn finalize(&self) -> Result<()>;

    /// Append additional records to an existing index. Serializes
    /// behind the writer lock alongside `add`.
    async fn append(&self, records: Vec<(String, Metadata)>) -> Result<()>;

    /// k-NN search, descending score, optionally narrowed by metadata
    /// filters.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> Result<Vec<SearchResult>>;

    /// Raw passages backing the index, for `FileGraph`.
    fn passages(&self) -> Vec<Passage>;

    /// The index's own query-embedding function, for `FileGraph`.
    fn embed(&self, text: &str) -> Vec<f32>;
}

struct Entry {
    passage: Passage,
    vector: Vec<f32>,
}

struct Inner {
    entries: Vec<Entry>,
    next_id: u64,
}

/// Default, in-process `VectorIndex`: brute-force cosine k-NN over an
/// `Embedder`. No approximation, no external index file format — sized
/// for a single user's personal-file corpus rather than a codebase with
/// millions of chunks.
pub struct InMemoryVectorIndex {
    inner: RwLock<Inner>,
    embedder: Arc<dyn Embedder>,
}

#[derive(Serialize, Deserialize)]
struct PersistedEntry {
    id: String,
    text: String,
    metadata: Metadata,
    vector: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    schema_version: u32,
    entries: Vec<PersistedEntry>,
}

const SCHEMA_VERSION: u32 = 1;

impl InMemoryVectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: Vec::new(),
                next_id: 0,
            }),
            embedder,
        }
    }

    pub fn with_hash_embedder() -> Self {
        Self::new(Arc::new(HashEmbedder::default()))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Persist to `<dir>/documents.leann` (spec.md §6 on-disk layout;
    /// the real format is opaque above this crate — we just need a
    /// stable name a manifest-driven rebuild can find).
    pub async fn save(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        let inner = self.inner.read().await;
        let persisted = PersistedIndex {
            schema_version: SCHEMA_VERSION,
            entries: inner
                .entries
                .iter()
                .map(|e| PersistedEntry {
                    id: e.passage.id.clone(),
                    text: e.passage.text.clone(),
                    metadata: e.passage.metadata.clone(),
                    vector: e.vector.clone(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&persisted)?;
        tokio::fs::write(dir.join("documents.leann"), json).await?;
        Ok(())
    }

    pub async fn load(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(dir.join("documents.leann")).await?;
        let persisted: PersistedIndex = serde_json::from_str(&raw)?;
        let entries = persisted
            .entries
            .into_iter()
            .map(|e| Entry {
                passage: Passage {
                    id: e.id,
                    text: e.text,
                    metadata: e.metadata,
                },
                vector: e.vector,
            })
            .collect::<Vec<_>>();
        let next_id = entries.len() as u64;
        Ok(Self {
            inner: RwLock::new(Inner { entries, next_id }),
            embedder,
        })
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn add(&self, text: String, metadata: Metadata) -> Result<()> {
        let vector = self.embedder.embed(&text);
        let mut inner = self.inner.write().await;
        let id = format!("passage-{}", inner.next_id);
        inner.next_id += 1;
        inner.entries.push(Entry {
            passage: Passage { id, text, metadata },
            vector,
        });
        Ok(())
    }

    async fn finalize(&self) -> Result<()> {
        Ok(())
    }

    async fn append(&self, records: Vec<(String, Metadata)>) -> Result<()> {
        for (text, metadata) in records {
            self.add(text, metadata).await?;
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(VectorStoreError::Other("top_k must be >= 1".to_string()));
        }
        let query_vector = self.embedder.embed(query);
        let inner = self.inner.read().await;

        let mut scored: Vec<SearchResult> = inner
            .entries
            .iter()
            .filter(|e| filters.map(|f| f.matches(&e.passage.metadata)).unwrap_or(true))
            .map(|e| SearchResult {
                id: e.passage.id.clone(),
                text: e.passage.text.clone(),
                score: cosine(&query_vector, &e.vector).clamp(0.0, 1.0),
                metadata: e.passage.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn passages(&self) -> Vec<Passage> {
        self.inner
            .try_read()
            .map(|inner| inner.entries.iter().map(|e| e.passage.clone()).collect())
            .unwrap_or_default()
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        self.embedder.embed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(path: &str) -> Metadata {
        Metadata::new(path).with_file_name(path.rsplit('/').next().unwrap_or(path))
    }

    #[tokio::test]
    async fn search_returns_descending_scores() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index
            .add(
                "Total Budget: $450,000. Revenue targets: Project Alpha $180k.".to_string(),
                meta("budget.txt"),
            )
            .await
            .unwrap();
        index
            .add("A photo of a cat on a windowsill.".to_string(), meta("cat.jpg"))
            .await
            .unwrap();

        let results = index.search("what is the budget?", 5, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert_eq!(results[0].metadata.file_name.as_deref(), Some("budget.txt"));
    }

    #[tokio::test]
    async fn append_then_search_sees_new_passage() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index.add("first file".to_string(), meta("a.txt")).await.unwrap();
        index
            .append(vec![("second file".to_string(), meta("b.txt"))])
            .await
            .unwrap();
        assert_eq!(index.len().await, 2);
    }

    #[tokio::test]
    async fn metadata_filter_narrows_results() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index.add("invoice text".to_string(), meta("invoice.pdf")).await.unwrap();
        index.add("invoice text".to_string(), meta("receipt.pdf")).await.unwrap();

        let filters = MetadataFilters::new().contains("file_name", "invoice");
        let results = index.search("invoice", 10, Some(&filters)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.file_name.as_deref(), Some("invoice.pdf"));
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let index = InMemoryVectorIndex::with_hash_embedder();
        index.add("hello world".to_string(), meta("a.txt")).await.unwrap();
        index.save(dir.path()).await.unwrap();

        let loaded = InMemoryVectorIndex::load(dir.path(), Arc::new(HashEmbedder::default()))
            .await
            .unwrap();
        assert_eq!(loaded.len().await, 1);
        assert_eq!(loaded.passages()[0].metadata.file_path, "a.txt");
    }
}
