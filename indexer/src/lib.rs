//! # Manole Indexer
//!
//! Builds and maintains the vector index for one data directory:
//! `KreuzbergIndexer` (spec.md §4.13) does the full build, the
//! manifest-diffed incremental update, and single-file append; the
//! `watcher` module drives the latter from filesystem events with a
//! fixed debounce.

mod build;
mod error;
mod manifest;
mod scan;
mod watcher;

pub use build::{BuildStats, KreuzbergIndexer};
pub use error::{IndexerError, Result};
pub use manifest::{FileRecord, Manifest};
pub use watcher::{start_watcher, WatcherHandle};
