use crate::error::ExtractorError;
use crate::types::{Chunk, Element, ExtractedDocument};
use crate::{Extractor, Result};
use async_trait::async_trait;
use std::path::Path;

/// Chunks text by blank-line-separated paragraphs, capping each chunk at
/// this many characters so nothing downstream has to re-split.
const MAX_CHUNK_CHARS: usize = 1_500;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "log", "csv", "json", "toml"];

/// Plain-text / markdown extraction. Office formats, PDFs and images
/// (OCR) are handled by the out-of-scope document-extraction backend
/// (spec.md §1); this extractor reports `ExtractorError::Unsupported`
/// for those so `KreuzbergIndexer` can skip them cleanly.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn supports(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for PlainTextExtractor {
    async fn extract_file(&self, path: &Path) -> Result<ExtractedDocument> {
        if !Self::supports(path) {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string();
            return Err(ExtractorError::Unsupported(ext));
        }

        let bytes = tokio::fs::read(path).await?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ExtractorError::InvalidText(e.to_string()))?;

        let chunks = split_into_chunks(&text);
        let elements = chunks
            .iter()
            .map(|_| Element {
                element_type: "paragraph".to_string(),
                page_number: None,
            })
            .collect();

        Ok(ExtractedDocument {
            text,
            chunks,
            elements,
        })
    }
}

fn split_into_chunks(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut index = 0u32;

    let mut flush = |current: &mut String, index: &mut u32, chunks: &mut Vec<Chunk>| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk {
                text: trimmed.to_string(),
                chunk_index: *index,
                page_number: None,
                element_type: Some("paragraph".to_string()),
            });
            *index += 1;
        }
        current.clear();
    };

    for paragraph in text.split("\n\n") {
        if current.len() + paragraph.len() > MAX_CHUNK_CHARS && !current.is_empty() {
            flush(&mut current, &mut index, &mut chunks);
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
        while current.len() > MAX_CHUNK_CHARS {
            let split_at = current
                .char_indices()
                .take_while(|(i, _)| *i < MAX_CHUNK_CHARS)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(current.len());
            let head: String = current.drain(..split_at).collect();
            chunks.push(Chunk {
                text: head.trim().to_string(),
                chunk_index: index,
                page_number: None,
                element_type: Some("paragraph".to_string()),
            });
            index += 1;
        }
    }
    flush(&mut current, &mut index, &mut chunks);

    if chunks.is_empty() && !text.trim().is_empty() {
        chunks.push(Chunk {
            text: text.trim().to_string(),
            chunk_index: 0,
            page_number: None,
            element_type: Some("paragraph".to_string()),
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn extracts_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut file = tokio::fs::File::create(&path).await.unwrap();
        file.write_all(b"first paragraph\n\nsecond paragraph").await.unwrap();
        file.flush().await.unwrap();

        let doc = PlainTextExtractor::new().extract_file(&path).await.unwrap();
        assert_eq!(doc.chunks.len(), 2);
        assert_eq!(doc.chunks[0].text, "first paragraph");
    }

    #[tokio::test]
    async fn rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let err = PlainTextExtractor::new().extract_file(&path).await.unwrap_err();
        assert!(matches!(err, ExtractorError::Unsupported(_)));
    }
}
