//! # Manole Extractor
//!
//! The `Extractor` port (spec.md §1: "out of scope, interfaces only" for
//! the real document-extraction backend) plus a concrete plain-text/
//! markdown implementation, and the on-demand `FileReader` built on top
//! of it.

mod error;
mod file_reader;
mod plain_text;
mod types;

pub use error::ExtractorError;
pub use file_reader::FileReader;
pub use plain_text::PlainTextExtractor;
pub use types::{Chunk, Element, ExtractedDocument};

use async_trait::async_trait;
use std::path::Path;

pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Produces `(text, chunks, elements)` for a path. The real
/// implementation (PDF, office formats, OCR'd images) lives outside this
/// repo's scope; this crate ships the plain-text path and a structured
/// failure for anything else, so every caller already codes against the
/// eventual full extractor's contract.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_file(&self, path: &Path) -> Result<ExtractedDocument>;
}
