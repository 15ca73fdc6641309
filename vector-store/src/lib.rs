//! # Manole Vector Store
//!
//! The `VectorIndex` port: build from `(text, metadata)` records,
//! incrementally append, and k-NN search with metadata filters. A single
//! writer lock serializes appends; readers tolerate pre- or post-append
//! state (spec.md §4.3).
//!
//! ```text
//! build(records) ─┐
//! append(records) ─┼─> [writer lock] ─> passages + vectors
//! search(query)    ┘          ^
//!                              └─ reads do not block on the writer lock
//! ```

mod embedder;
mod error;
mod filter;
mod index;
mod types;

pub use embedder::{Embedder, HashEmbedder};
#[cfg(feature = "semantic")]
pub use embedder::OnnxEmbedder;
pub use error::VectorStoreError;
pub use filter::{FilterOp, MetadataFilters};
pub use index::{InMemoryVectorIndex, VectorIndex};
pub use types::{Metadata, Passage, SearchResult};

pub type Result<T> = std::result::Result<T, VectorStoreError>;
