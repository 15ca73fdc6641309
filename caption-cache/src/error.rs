use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionCacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
