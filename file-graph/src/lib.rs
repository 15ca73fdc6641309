//! # Manole File Graph
//!
//! Pure computation over an existing index: group passages into file
//! nodes, then derive similarity, reference, and structure edges
//! (spec.md §4.14). No state of its own — cached and invalidated by
//! whoever owns the index (the `Server`, on `reindex`).

mod builder;
mod types;

pub use builder::compute;
pub use types::{EdgeKind, FileEdge, FileGraph, FileNode};
