use crate::{ChatMessage, Model, ModelError, OnToken};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Wraps a shared `Model` behind a single lock so inference calls from
/// the agent, the rewriter, the searcher's fact extraction, and vision
/// captioning are serialized (spec.md §5: "the system serializes all
/// inference calls ... behind a single model lock").
#[derive(Clone)]
pub struct ModelHandle {
    inner: Arc<Mutex<Arc<dyn Model>>>,
}

impl ModelHandle {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(model)),
        }
    }

    pub async fn generate(
        &self,
        messages: &[ChatMessage],
        max_tokens: usize,
        stream: bool,
        on_token: Option<OnToken<'_>>,
    ) -> Result<String, ModelError> {
        let model = self.inner.lock().await;
        model.generate(messages, max_tokens, stream, on_token).await
    }

    pub async fn caption_image(&self, image_bytes: &[u8]) -> Result<String, ModelError> {
        let model = self.inner.lock().await;
        model.caption_image(image_bytes).await
    }
}
