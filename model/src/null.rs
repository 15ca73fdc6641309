use crate::{ChatMessage, Model, ModelError, OnToken};
use async_trait::async_trait;
use std::sync::Mutex;

/// Deterministic test double. Streams its canned reply one word at a
/// time when asked to stream, never touches a real model file. Used by
/// every component's unit tests so the suite runs fully offline.
pub struct NullModel {
    reply: String,
    loaded: Mutex<bool>,
}

impl NullModel {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            loaded: Mutex::new(true),
        }
    }

    /// A `NullModel` that reports `ModelUnavailable` until `load()` is
    /// called, for exercising the "before load" failure mode.
    pub fn unloaded(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            loaded: Mutex::new(false),
        }
    }

    pub fn load(&self) {
        *self.loaded.lock().unwrap() = true;
    }
}

#[async_trait]
impl Model for NullModel {
    async fn generate(
        &self,
        _messages: &[ChatMessage],
        _max_tokens: usize,
        stream: bool,
        on_token: Option<OnToken<'_>>,
    ) -> Result<String, ModelError> {
        if !*self.loaded.lock().unwrap() {
            return Err(ModelError::ModelUnavailable);
        }
        if stream {
            if let Some(cb) = on_token {
                for word in self.reply.split_inclusive(' ') {
                    cb(word);
                }
            }
        }
        Ok(self.reply.clone())
    }

    async fn caption_image(&self, image_bytes: &[u8]) -> Result<String, ModelError> {
        if !*self.loaded.lock().unwrap() {
            return Err(ModelError::ModelUnavailable);
        }
        Ok(format!("a photo ({} bytes)", image_bytes.len()))
    }
}
