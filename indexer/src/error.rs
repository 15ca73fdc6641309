use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest JSON error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("vector store error: {0}")]
    VectorStore(#[from] manole_vector_store::VectorStoreError),

    #[error("extraction error: {0}")]
    Extract(#[from] manole_extractor::ExtractorError),

    #[error("invalid data directory: {0}")]
    InvalidPath(String),
}
