use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptionerError {
    #[error(transparent)]
    VectorStore(#[from] manole_vector_store::VectorStoreError),
}
