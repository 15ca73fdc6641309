use crate::plain_text::PlainTextExtractor;
use crate::{Extractor, ExtractorError, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;

/// Output is capped so a single file read can never blow out the
/// agent's context window (spec.md §4.4).
pub const MAX_OUTPUT_CHARS: usize = 4_000;

/// On-demand text extraction from arbitrary files. The underlying
/// converter is only constructed on first use — matching the teacher's
/// lazy-init discipline for heavy one-time setup (scanner/chunker
/// construction in `crates/indexer/src/scanner.rs`).
pub struct FileReader {
    extractor: OnceCell<Arc<dyn Extractor>>,
    factory: Box<dyn Fn() -> Arc<dyn Extractor> + Send + Sync>,
}

impl FileReader {
    pub fn new() -> Self {
        Self::with_factory(|| Arc::new(PlainTextExtractor::new()) as Arc<dyn Extractor>)
    }

    pub fn with_factory(
        factory: impl Fn() -> Arc<dyn Extractor> + Send + Sync + 'static,
    ) -> Self {
        Self {
            extractor: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    fn extractor(&self) -> Arc<dyn Extractor> {
        self.extractor.get_or_init(|| (self.factory)()).clone()
    }

    /// Read and extract the full text of `path`, truncated to
    /// `MAX_OUTPUT_CHARS`. Per-call failures (`ExtractorError`) are the
    /// caller's to decide whether to continue past.
    pub async fn read(&self, path: &Path) -> Result<String> {
        let doc = self.extractor().extract_file(path).await?;
        Ok(truncate_chars(&doc.text, MAX_OUTPUT_CHARS))
    }
}

impl Default for FileReader {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_and_truncates_long_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        let content = "x".repeat(MAX_OUTPUT_CHARS * 2);
        tokio::fs::write(&path, &content).await.unwrap();

        let reader = FileReader::new();
        let text = reader.read(&path).await.unwrap();
        assert_eq!(text.chars().count(), MAX_OUTPUT_CHARS);
    }

    #[tokio::test]
    async fn surfaces_unsupported_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        tokio::fs::write(&path, b"%PDF").await.unwrap();

        let reader = FileReader::new();
        let err = reader.read(&path).await.unwrap_err();
        assert!(matches!(err, ExtractorError::Unsupported(_)));
    }
}
