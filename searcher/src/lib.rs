//! # Manole Searcher
//!
//! Two-stage retrieval (spec.md §4.8): a k-NN pass over the `VectorIndex`
//! narrows to a handful of chunks, then a per-chunk MAP call against the
//! `Model` decides relevance and pulls out the specific facts rather
//! than returning raw passage text. When nothing survives — including
//! when the vector index itself comes back empty — a filename-grep
//! fallback gives the index a second chance before giving up.

mod error;
mod fact;
mod fallback;
mod prompts;

pub use error::SearcherError;

use fact::FactGroups;
use manole_extractor::FileReader;
use manole_model::{ChatMessage, ModelHandle};
use manole_toolbox::ToolBox;
use manole_vector_store::{SearchResult, VectorIndex};
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, SearcherError>;

/// Default `top_k` for `search_and_extract` (spec.md §4.8).
pub const DEFAULT_TOP_K: usize = 5;

/// Score pre-filter ratio: results scoring below `0.8 * s0` are dropped
/// once there is more than one result (spec.md §4.8 step 2).
const SCORE_PREFILTER_RATIO: f32 = 0.8;

pub struct Searcher {
    index: Arc<dyn VectorIndex>,
    model: ModelHandle,
    file_reader: Option<Arc<FileReader>>,
    toolbox: Option<Arc<ToolBox>>,
}

impl Searcher {
    pub fn new(index: Arc<dyn VectorIndex>, model: ModelHandle) -> Self {
        Self {
            index,
            model,
            file_reader: None,
            toolbox: None,
        }
    }

    /// Wire the filename fallback (spec.md §4.8 step 5). Without both a
    /// `FileReader` and a `ToolBox`, the fallback is skipped and an empty
    /// vector-search result falls straight through to "no matching
    /// content found".
    pub fn with_fallback(mut self, file_reader: Arc<FileReader>, toolbox: Arc<ToolBox>) -> Self {
        self.file_reader = Some(file_reader);
        self.toolbox = Some(toolbox);
        self
    }

    pub async fn search_and_extract(&self, query: &str, top_k: usize) -> Result<(String, Vec<String>)> {
        let results = self.index.search(query, top_k, None).await?;
        let had_results = !results.is_empty();

        let mut groups = FactGroups::default();
        if had_results {
            for result in score_prefilter(results) {
                let source = source_name(&result);
                for fact in self.extract_facts(query, &source, &result.text).await {
                    groups.push(&source, fact);
                }
            }
        }

        if groups.is_empty() {
            self.fill_from_filename_fallback(query, &mut groups).await;
        }

        if groups.is_empty() {
            let message = if had_results {
                "Search returned results but none were relevant to the query."
            } else {
                "No matching content found."
            };
            return Ok((message.to_string(), Vec::new()));
        }

        Ok((groups.format(), groups.sources()))
    }

    async fn fill_from_filename_fallback(&self, query: &str, groups: &mut FactGroups) {
        let (Some(file_reader), Some(toolbox)) = (&self.file_reader, &self.toolbox) else {
            return;
        };
        let candidates = fallback::candidate_files(query, toolbox, file_reader).await;
        for (name, text) in candidates {
            for fact in self.extract_facts(query, &name, &text).await {
                groups.push(&name, fact);
            }
        }
    }

    async fn extract_facts(&self, query: &str, source: &str, chunk_text: &str) -> Vec<String> {
        let truncated: String = chunk_text.chars().take(prompts::CHUNK_TRUNCATE_CHARS).collect();
        let messages = [
            ChatMessage::system(prompts::MAP_SYSTEM_PROMPT),
            ChatMessage::user(format!("Question: {query}\n\n[{source}]\n{truncated}")),
        ];
        let reply = match self
            .model
            .generate(&messages, prompts::MAP_MAX_TOKENS, false, None)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                log::debug!("MAP call failed for source {source}: {err}");
                return Vec::new();
            }
        };
        match manole_jsonx::parse_json(&reply) {
            Some(value) => fact::facts_from_reply(&value),
            // A chunk whose MAP reply doesn't parse is treated as
            // irrelevant, never as raw text passed through as a fact
            // (spec.md §4.8 step 3).
            None => {
                log::debug!("MAP reply for source {source} was not valid JSON");
                Vec::new()
            }
        }
    }
}

fn score_prefilter(results: Vec<SearchResult>) -> Vec<SearchResult> {
    if results.len() <= 1 {
        return results;
    }
    let top_score = results[0].score;
    let floor = top_score * SCORE_PREFILTER_RATIO;
    results.into_iter().filter(|r| r.score >= floor).collect()
}

/// Preferring `file_name`, falling back to `file_path`, then the chunk
/// id (spec.md §4.8 step 4).
fn source_name(result: &SearchResult) -> String {
    result
        .metadata
        .file_name
        .clone()
        .or_else(|| {
            (!result.metadata.file_path.is_empty()).then(|| result.metadata.file_path.clone())
        })
        .unwrap_or_else(|| result.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use manole_model::{Model, ModelError};
    use manole_vector_store::{InMemoryVectorIndex, Metadata};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedModel {
        replies: Vec<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate(
            &self,
            _messages: &[ChatMessage],
            _max_tokens: usize,
            _stream: bool,
            _on_token: Option<manole_model::OnToken<'_>>,
        ) -> std::result::Result<String, ModelError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.replies.get(i).copied().unwrap_or(r#"{"relevant": false, "facts": []}"#).to_string())
        }

        async fn caption_image(&self, _image_bytes: &[u8]) -> std::result::Result<String, ModelError> {
            Ok(String::new())
        }
    }

    fn model_handle(replies: Vec<&'static str>) -> ModelHandle {
        ModelHandle::new(Arc::new(ScriptedModel {
            replies,
            calls: AtomicUsize::new(0),
        }))
    }

    #[tokio::test]
    async fn extracts_facts_from_the_single_best_chunk() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index
            .add(
                "Q4 revenue was 4.2 million dollars".to_string(),
                Metadata::new("/docs/report.txt").with_file_name("report.txt"),
            )
            .await
            .unwrap();
        index.finalize().await.unwrap();

        let model = model_handle(vec![r#"{"relevant": true, "facts": [{"name": "Q4 revenue", "value": "4.2 million dollars"}]}"#]);
        let searcher = Searcher::new(Arc::new(index), model);

        let (text, sources) = searcher.search_and_extract("what was Q4 revenue", 5).await.unwrap();
        assert_eq!(sources, vec!["report.txt".to_string()]);
        assert!(text.contains("From report.txt:"));
        assert!(text.contains("Q4 revenue: 4.2 million dollars"));
    }

    #[tokio::test]
    async fn no_results_without_fallback_reports_no_matching_content() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        let model = model_handle(vec![]);
        let searcher = Searcher::new(Arc::new(index), model);

        let (text, sources) = searcher.search_and_extract("anything", 5).await.unwrap();
        assert_eq!(text, "No matching content found.");
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn irrelevant_results_report_none_relevant() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index
            .add("unrelated passage text".to_string(), Metadata::new("/docs/a.txt").with_file_name("a.txt"))
            .await
            .unwrap();
        index.finalize().await.unwrap();

        let model = model_handle(vec![r#"{"relevant": false, "facts": []}"#]);
        let searcher = Searcher::new(Arc::new(index), model);

        let (text, sources) = searcher.search_and_extract("unrelated query", 5).await.unwrap();
        assert_eq!(text, "Search returned results but none were relevant to the query.");
        assert!(sources.is_empty());
    }

    #[test]
    fn score_prefilter_drops_low_scoring_tail() {
        let make = |score: f32| SearchResult {
            id: format!("id-{score}"),
            text: String::new(),
            score,
            metadata: Metadata::new("/x"),
        };
        let results = vec![make(0.9), make(0.8), make(0.5)];
        let kept = score_prefilter(results);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn source_name_prefers_file_name_then_path_then_id() {
        let with_name = SearchResult {
            id: "1".into(),
            text: String::new(),
            score: 1.0,
            metadata: Metadata::new("/docs/a.txt").with_file_name("a.txt"),
        };
        assert_eq!(source_name(&with_name), "a.txt");

        let path_only = SearchResult {
            id: "2".into(),
            text: String::new(),
            score: 1.0,
            metadata: Metadata::new("/docs/b.txt"),
        };
        assert_eq!(source_name(&path_only), "/docs/b.txt");

        let neither = SearchResult {
            id: "3".into(),
            text: String::new(),
            score: 1.0,
            metadata: Metadata::new(""),
        };
        assert_eq!(source_name(&neither), "3");
    }
}
