use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearcherError {
    #[error("vector index error: {0}")]
    Index(#[from] manole_vector_store::VectorStoreError),
}
