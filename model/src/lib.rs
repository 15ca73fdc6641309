//! # Manole Model
//!
//! The narrow seam between the core and the underlying local LLM runtime
//! (a quantized GGUF model, text-only and vision-language variants). The
//! runtime itself is out of scope — this crate only defines the contract
//! and a couple of small implementations good enough to drive everything
//! above it without a real model file.

mod error;
mod handle;
mod null;

pub use error::ModelError;
pub use handle::ModelHandle;
pub use null::NullModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
        }
    }
}

/// Synchronous per-token delivery callback. Called once per decoded text
/// delta, strictly before the next delta is produced (spec.md §4.2).
pub type OnToken<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Chat-completion and vision-caption port over a local model.
///
/// Decoding is always deterministic (low temperature, tight top-k/top-p);
/// callers never pass sampling knobs, so implementations should fix those
/// internally rather than exposing them here.
#[async_trait]
pub trait Model: Send + Sync {
    /// Generate a full completion for `messages`. When `stream` is true
    /// and `on_token` is `Some`, every decoded delta is delivered to the
    /// callback before the next one is produced; the return value is
    /// always the full concatenated text regardless of streaming.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        max_tokens: usize,
        stream: bool,
        on_token: Option<OnToken<'_>>,
    ) -> Result<String, ModelError>;

    /// Caption an image from raw (already-normalized) bytes.
    async fn caption_image(&self, image_bytes: &[u8]) -> Result<String, ModelError>;
}
