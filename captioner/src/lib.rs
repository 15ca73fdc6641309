//! # Manole Captioner
//!
//! Background worker bound to one directory entry: enumerate images,
//! skip ones already in the `CaptionCache`, caption the rest one at a
//! time (with a single-slot read-ahead prefetch), and append a passage
//! per caption to the live vector index (spec.md §4.12).

mod enumerate;
mod error;
mod normalize;

pub use error::CaptionerError;

use manole_caption_cache::CaptionCache;
use manole_model::ModelHandle;
use manole_vector_store::{Metadata, VectorIndex};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;

pub type Result<T> = std::result::Result<T, CaptionerError>;

/// Callback invoked once per `captioning_progress`/completion/error
/// event (spec.md §4.12 step 3e, step 4).
pub type OnEvent<'a> = &'a (dyn Fn(Value) + Send + Sync);

/// Cooperative cancellation flag shared between the `Server` and a
/// running `ImageCaptioner::run` future (spec.md: "stop flag checked
/// between images").
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ImageCaptioner {
    directory_id: String,
    data_dir: PathBuf,
    index: Arc<dyn VectorIndex>,
    model: ModelHandle,
    cache: CaptionCache,
}

impl ImageCaptioner {
    pub fn new(
        directory_id: impl Into<String>,
        data_dir: impl AsRef<Path>,
        index: Arc<dyn VectorIndex>,
        model: ModelHandle,
    ) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            directory_id: directory_id.into(),
            cache: CaptionCache::new(&data_dir),
            data_dir,
            index,
            model,
        }
    }

    /// Run the full scan-caption-append pipeline until every image is
    /// captioned, the stop flag is set, or a terminal failure occurs.
    pub async fn run(&self, stop: &StopFlag, on_event: Option<OnEvent<'_>>) {
        let candidates = enumerate::image_files(&self.data_dir);

        let mut pending = Vec::with_capacity(candidates.len());
        for path in candidates {
            match self.mtime_string(&path).await {
                Ok(mtime) => match self.cache.get(&path, &mtime).await {
                    Ok(Some(_)) => {}
                    Ok(None) => pending.push((path, mtime)),
                    Err(e) => log::warn!("caption cache lookup failed for {path:?}: {e}"),
                },
                Err(e) => log::warn!("could not stat {path:?}: {e}"),
            }
        }

        let total = pending.len();
        let mut done = 0usize;

        let mut prefetched = Self::prefetch(pending.first()).await;

        for (i, (path, mtime)) in pending.iter().enumerate() {
            if stop.is_stopped() {
                return;
            }

            let Some(bytes) = prefetched.take() else {
                log::warn!("skipping unreadable image {path:?}");
                prefetched = Self::prefetch(pending.get(i + 1)).await;
                continue;
            };

            let jpeg = match normalize::normalize_to_jpeg(&bytes) {
                Ok(jpeg) => jpeg,
                Err(e) => {
                    log::warn!("skipping image {path:?}: {e}");
                    prefetched = Self::prefetch(pending.get(i + 1)).await;
                    continue;
                }
            };

            // Overlap inference on this image with reading the next
            // image's bytes off disk (spec.md §4.12: "single-slot
            // prefetch... may overlap the current image's inference").
            let (caption_result, next_bytes) = tokio::join!(
                self.model.caption_image(&jpeg),
                Self::prefetch(pending.get(i + 1))
            );
            prefetched = next_bytes;

            let caption = match caption_result {
                Ok(caption) => caption,
                Err(e) => {
                    log::error!("vision model unavailable, stopping captioner: {e}");
                    Self::emit(
                        on_event,
                        json!({
                            "directoryId": self.directory_id,
                            "state": "error",
                            "message": format!("vision model unavailable: {e}"),
                        }),
                    );
                    return;
                }
            };

            if let Err(e) = self.cache.put(path, mtime, &caption).await {
                log::warn!("failed to persist caption for {path:?}: {e}");
            }

            if let Err(e) = self.append_passage(path, &caption).await {
                log::warn!("failed to index caption for {path:?}: {e}");
            }

            done += 1;
            Self::emit(
                on_event,
                json!({"directoryId": self.directory_id, "done": done, "total": total}),
            );
        }

        Self::emit(
            on_event,
            json!({
                "directoryId": self.directory_id,
                "done": done,
                "total": total,
                "state": "complete",
            }),
        );
    }

    async fn prefetch(entry: Option<&(PathBuf, String)>) -> Option<Vec<u8>> {
        let (path, _) = entry?;
        fs::read(path).await.ok()
    }

    async fn mtime_string(&self, path: &Path) -> std::result::Result<String, std::io::Error> {
        let meta = fs::metadata(path).await?;
        let modified = meta.modified()?;
        let since_epoch = modified
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Ok(since_epoch.as_secs().to_string())
    }

    async fn append_passage(&self, path: &Path, caption: &str) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let metadata = Metadata::new(path.to_string_lossy().to_string())
            .with_file_name(file_name)
            .with_file_type("image");
        let text = format!("Photo description: {caption}");
        self.index.append(vec![(text, metadata)]).await?;
        Ok(())
    }

    fn emit(on_event: Option<OnEvent<'_>>, data: Value) {
        if let Some(cb) = on_event {
            cb(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use manole_model::{ChatMessage, Model, ModelError, OnToken};
    use manole_vector_store::{InMemoryVectorIndex, SearchResult};
    use std::sync::Mutex as StdMutex;

    struct ScriptedCaptioner {
        reply: StdMutex<std::result::Result<String, String>>,
    }

    #[async_trait]
    impl Model for ScriptedCaptioner {
        async fn generate(
            &self,
            _messages: &[ChatMessage],
            _max_tokens: usize,
            _stream: bool,
            _on_token: Option<OnToken<'_>>,
        ) -> std::result::Result<String, ModelError> {
            Ok(String::new())
        }

        async fn caption_image(&self, _image_bytes: &[u8]) -> std::result::Result<String, ModelError> {
            match &*self.reply.lock().unwrap() {
                Ok(caption) => Ok(caption.clone()),
                Err(msg) => Err(ModelError::ModelError(msg.clone())),
            }
        }
    }

    fn png_bytes() -> Vec<u8> {
        use image::{ImageBuffer, Rgb};
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(10, 10, Rgb([1, 2, 3]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn captions_new_images_and_appends_to_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes()).unwrap();

        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::with_hash_embedder());
        let model = ModelHandle::new(Arc::new(ScriptedCaptioner {
            reply: StdMutex::new(Ok("a red square".to_string())),
        }));
        let captioner = ImageCaptioner::new("dir-1", dir.path(), index.clone(), model);

        let events = StdMutex::new(Vec::new());
        let cb = |data: Value| events.lock().unwrap().push(data);
        captioner.run(&StopFlag::new(), Some(&cb)).await;

        let results = index
            .search("red square", 5, None)
            .await
            .unwrap();
        assert!(results
            .iter()
            .any(|r: &SearchResult| r.text.contains("a red square")));

        let collected = events.into_inner().unwrap();
        assert!(collected
            .iter()
            .any(|e| e.get("state").and_then(Value::as_str) == Some("complete")));
    }

    #[tokio::test]
    async fn already_cached_images_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let cache = CaptionCache::new(dir.path());
        let meta = tokio::fs::metadata(&path).await.unwrap();
        let mtime = meta
            .modified()
            .unwrap()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
            .to_string();
        cache.put(&path, &mtime, "already captioned").await.unwrap();

        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::with_hash_embedder());
        let model = ModelHandle::new(Arc::new(ScriptedCaptioner {
            reply: StdMutex::new(Err("should not be called".to_string())),
        }));
        let captioner = ImageCaptioner::new("dir-1", dir.path(), index, model);
        captioner.run(&StopFlag::new(), None).await;
    }

    #[tokio::test]
    async fn stop_flag_halts_before_the_next_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes()).unwrap();
        std::fs::write(dir.path().join("b.png"), png_bytes()).unwrap();

        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::with_hash_embedder());
        let model = ModelHandle::new(Arc::new(ScriptedCaptioner {
            reply: StdMutex::new(Ok("a caption".to_string())),
        }));
        let captioner = ImageCaptioner::new("dir-1", dir.path(), index, model);

        let stop = StopFlag::new();
        stop.stop();
        captioner.run(&stop, None).await;
    }
}
