use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("not valid UTF-8 text: {0}")]
    InvalidText(String),

    #[error("{0}")]
    Other(String),
}
