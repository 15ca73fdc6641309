//! # Manole Rewriter
//!
//! `QueryRewriter` (spec.md §4.9): resolves coreferences against prior
//! turns, expands the query into a search-friendly phrase, and
//! classifies what kind of answer the user wants. Always falls back to
//! an identity rewrite rather than surfacing a model or parse failure to
//! the caller — a raw, unrewritten query is always a safe thing to
//! search with.

mod intent;
mod prompts;

pub use intent::Intent;

use manole_model::{ChatMessage, ModelHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub intent: Intent,
    pub search_query: String,
    pub resolved_query: String,
}

impl Rewrite {
    fn identity(query: &str) -> Self {
        Self {
            intent: Intent::Factual,
            search_query: query.to_string(),
            resolved_query: query.to_string(),
        }
    }
}

pub struct QueryRewriter {
    model: ModelHandle,
}

impl QueryRewriter {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    /// `context`, when present, is transcript-style prior turns —
    /// prepended to the user message, never folded into the system
    /// prompt (spec.md §4.9).
    pub async fn rewrite(&self, query: &str, context: Option<&str>) -> Rewrite {
        let user_message = match context {
            Some(context) if !context.is_empty() => format!("{context}\n\nQuestion: {query}"),
            _ => format!("Question: {query}"),
        };
        let messages = [
            ChatMessage::system(prompts::REWRITER_SYSTEM_PROMPT),
            ChatMessage::user(user_message),
        ];

        let reply = match self
            .model
            .generate(&messages, prompts::REWRITE_MAX_TOKENS, false, None)
            .await
        {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => return Rewrite::identity(query),
            Err(err) => {
                log::debug!("rewrite call failed, falling back to identity rewrite: {err}");
                return Rewrite::identity(query);
            }
        };

        let Some(value) = manole_jsonx::parse_json(&reply) else {
            return Rewrite::identity(query);
        };

        let intent = value
            .get("intent")
            .and_then(|v| v.as_str())
            .map(Intent::parse)
            .unwrap_or(Intent::Factual);
        let search_query = value
            .get("search_query")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| query.to_string());
        let resolved_query = value
            .get("resolved_query")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| query.to_string());

        Rewrite {
            intent,
            search_query,
            resolved_query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use manole_model::{Model, ModelError, OnToken};
    use std::sync::Arc;

    struct ScriptedModel(&'static str);

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate(
            &self,
            _messages: &[ChatMessage],
            _max_tokens: usize,
            _stream: bool,
            _on_token: Option<OnToken<'_>>,
        ) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }

        async fn caption_image(&self, _image_bytes: &[u8]) -> Result<String, ModelError> {
            Ok(String::new())
        }
    }

    fn rewriter(reply: &'static str) -> QueryRewriter {
        QueryRewriter::new(ModelHandle::new(Arc::new(ScriptedModel(reply))))
    }

    #[tokio::test]
    async fn parses_a_well_formed_rewrite() {
        let rw = rewriter(r#"{"intent": "count", "search_query": "invoices 2023", "resolved_query": "how many invoices did I have in 2023"}"#);
        let result = rw.rewrite("how many did I have that year", Some("User: I'm asking about invoices from 2023")).await;
        assert_eq!(result.intent, Intent::Count);
        assert_eq!(result.search_query, "invoices 2023");
    }

    #[tokio::test]
    async fn unknown_intent_falls_back_to_factual() {
        let rw = rewriter(r#"{"intent": "chit_chat", "search_query": "hello", "resolved_query": "hello"}"#);
        let result = rw.rewrite("hi", None).await;
        assert_eq!(result.intent, Intent::Factual);
    }

    #[tokio::test]
    async fn unparseable_reply_is_an_identity_rewrite() {
        let rw = rewriter("not json at all");
        let result = rw.rewrite("what is my total spend", None).await;
        assert_eq!(result.intent, Intent::Factual);
        assert_eq!(result.search_query, "what is my total spend");
        assert_eq!(result.resolved_query, "what is my total spend");
    }

    #[tokio::test]
    async fn empty_reply_is_an_identity_rewrite() {
        let rw = rewriter("   ");
        let result = rw.rewrite("anything", None).await;
        assert_eq!(result.resolved_query, "anything");
    }
}
