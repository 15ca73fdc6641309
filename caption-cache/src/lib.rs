//! # Manole Caption Cache
//!
//! A persistent, path-and-mtime-keyed caption store: one small file per
//! caption under `<data_dir>/.neurofind/captions/`. Invalidation is
//! implicit — change the mtime, get a new key, get a cache miss
//! (spec.md §4.11), mirroring the content-addressed design of the
//! teacher's `crates/vector-store/src/embedding_cache.rs`.

mod error;

pub use error::CaptionCacheError;

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, CaptionCacheError>;

pub struct CaptionCache {
    dir: PathBuf,
}

impl CaptionCache {
    /// `data_dir/.neurofind/captions` per spec.md §6's on-disk layout.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join(".neurofind").join("captions"),
        }
    }

    fn key_for(path: &Path, mtime: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(mtime.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, path: &Path, mtime: &str) -> PathBuf {
        self.dir.join(Self::key_for(path, mtime))
    }

    pub async fn get(&self, path: &Path, mtime: &str) -> Result<Option<String>> {
        let entry = self.entry_path(path, mtime);
        match tokio::fs::read_to_string(&entry).await {
            Ok(caption) => Ok(Some(caption)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn put(&self, path: &Path, mtime: &str, caption: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let entry = self.entry_path(path, mtime);
        tokio::fs::write(entry, caption).await?;
        Ok(())
    }
}

/// Minimal hex encoder so this crate doesn't need a dedicated `hex`
/// dependency for a 32-byte digest.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        use std::fmt::Write;
        let mut out = String::with_capacity(bytes.as_ref().len() * 2);
        for byte in bytes.as_ref() {
            write!(out, "{byte:02x}").unwrap();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CaptionCache::new(dir.path());
        let path = Path::new("photo.jpg");
        cache.put(path, "12345", "a dog on a beach").await.unwrap();
        let caption = cache.get(path, "12345").await.unwrap();
        assert_eq!(caption.as_deref(), Some("a dog on a beach"));
    }

    #[tokio::test]
    async fn mtime_change_is_a_cache_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CaptionCache::new(dir.path());
        let path = Path::new("photo.jpg");
        cache.put(path, "12345", "a dog on a beach").await.unwrap();
        let caption = cache.get(path, "67890").await.unwrap();
        assert!(caption.is_none());
    }

    #[tokio::test]
    async fn missing_entry_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CaptionCache::new(dir.path());
        let caption = cache.get(Path::new("nope.jpg"), "1").await.unwrap();
        assert!(caption.is_none());
    }
}
