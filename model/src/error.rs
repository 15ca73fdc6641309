use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("model not loaded")]
    ModelUnavailable,

    #[error("inference failed: {0}")]
    ModelError(String),
}
