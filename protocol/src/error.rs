use thiserror::Error;

/// Errors surfaced by the framing layer itself (not by the handlers the
/// frames are routed to — see spec.md §7 for the full error taxonomy,
/// most of which lives closer to the component that raises it).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not initialized")]
    NotInitialized,

    #[error("unknown directory: {0}")]
    UnknownDirectory(String),

    #[error("directory not ready: {0}")]
    DirectoryNotReady(String),

    #[error("failed to encode response: {0}")]
    Encode(String),
}
