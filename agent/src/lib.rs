//! # Manole Agent
//!
//! The core reasoning loop (spec.md §4.10): at most `MAX_STEPS` calls to
//! the `Model`, each optionally followed by one tool call. Two sources
//! ever force a tool call the model didn't ask for — `Router` on the
//! very first step, and the keyword-coverage follow-up check on later
//! steps — and neither one ever overrides a tool call the model itself
//! made.

mod followup;
mod parser;
mod prompts;

pub use parser::ToolCall;

use manole_model::{ChatMessage, ModelHandle, OnToken};
use manole_tools::ToolRegistry;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

pub const MAX_STEPS: usize = 5;
pub const MAX_HISTORY_MESSAGES: usize = 4;

#[derive(Debug, Clone)]
pub struct AgentStep {
    pub step: usize,
    pub tool: String,
    pub params: Value,
}

pub type OnStep<'a> = &'a (dyn Fn(&AgentStep) + Send + Sync);

pub struct Agent {
    model: ModelHandle,
    tools: Arc<ToolRegistry>,
}

impl Agent {
    pub fn new(model: ModelHandle, tools: Arc<ToolRegistry>) -> Self {
        Self { model, tools }
    }

    /// `history` is raw user/assistant turns, oldest first; only the
    /// last `MAX_HISTORY_MESSAGES` are sent. `resolved_query` (the
    /// rewriter's output) is what the model sees; `original_query` (raw
    /// user text) is what the router and follow-up check reason about.
    pub async fn run(
        &self,
        original_query: &str,
        resolved_query: &str,
        intent: &str,
        history: &[ChatMessage],
        on_token: Option<OnToken<'_>>,
        on_step: Option<OnStep<'_>>,
    ) -> (String, Vec<String>) {
        let tool_defs = self.tools.tool_defs();
        let known_tool_names: Vec<&str> = tool_defs.iter().map(|t| t.name).collect();

        let mut messages = vec![ChatMessage::system(prompts::system_prompt(&tool_defs))];
        let tail_start = history.len().saturating_sub(MAX_HISTORY_MESSAGES);
        messages.extend(history[tail_start..].iter().cloned());
        messages.push(ChatMessage::user(resolved_query));

        let mut accumulated_sources = Vec::new();
        let mut tool_results_text = String::new();
        let mut used_tools: HashSet<String> = HashSet::new();
        let stream = on_token.is_some();

        for step in 0..MAX_STEPS {
            let raw_text = match self
                .model
                .generate(&messages, prompts::GENERATE_MAX_TOKENS, stream, on_token)
                .await
            {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("agent model call failed at step {step}: {err}");
                    return (String::new(), accumulated_sources);
                }
            };

            let tool_call = parser::parse_tool_call(&raw_text, &known_tool_names);

            let injected = if tool_call.is_none() {
                if step == 0 {
                    let routed = manole_router::route(original_query, Some(intent));
                    Some(ToolCall {
                        name: routed.tool_name,
                        params: routed.params,
                    })
                } else {
                    followup::next_tool_call(original_query, &tool_results_text, &used_tools).map(
                        |follow_up| ToolCall {
                            name: follow_up.tool_name.to_string(),
                            params: follow_up.params,
                        },
                    )
                }
            } else {
                None
            };

            match tool_call.or(injected) {
                Some(call) if call.name == "respond" => {
                    let answer = call
                        .params
                        .get("answer")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    return (answer.unwrap_or(raw_text), accumulated_sources);
                }
                Some(call) => {
                    let (result_text, sources) = self.tools.dispatch(&call.name, &call.params).await;
                    accumulated_sources.extend(sources);
                    used_tools.insert(call.name.clone());
                    tool_results_text.push_str(&result_text);
                    tool_results_text.push('\n');

                    messages.push(ChatMessage::assistant(raw_text));
                    messages.push(ChatMessage::tool(result_text.clone()));

                    if let Some(on_step) = on_step {
                        on_step(&AgentStep {
                            step,
                            tool: call.name,
                            params: call.params,
                        });
                    }
                }
                None => return (raw_text, accumulated_sources),
            }
        }

        messages.push(ChatMessage::user(prompts::FINAL_ANSWER_PROMPT));
        match self
            .model
            .generate(&messages, prompts::GENERATE_MAX_TOKENS, stream, on_token)
            .await
        {
            Ok(text) => (text, accumulated_sources),
            Err(err) => {
                log::warn!("final-answer model call failed after loop exhaustion: {err}");
                (String::new(), accumulated_sources)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use manole_model::{Model, ModelError};
    use manole_searcher::Searcher;
    use manole_toolbox::ToolBox;
    use manole_vector_store::InMemoryVectorIndex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate(
            &self,
            _messages: &[ChatMessage],
            _max_tokens: usize,
            _stream: bool,
            _on_token: Option<OnToken<'_>>,
        ) -> Result<String, ModelError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            let replies = self.replies.lock().unwrap();
            Ok(replies.get(i).cloned().unwrap_or_else(|| replies.last().cloned().unwrap()))
        }

        async fn caption_image(&self, _image_bytes: &[u8]) -> Result<String, ModelError> {
            Ok(String::new())
        }
    }

    fn agent(replies: Vec<&str>, dir: &std::path::Path) -> Agent {
        let model = ModelHandle::new(Arc::new(ScriptedModel::new(replies)));
        let index = Arc::new(InMemoryVectorIndex::with_hash_embedder());
        let searcher = Arc::new(Searcher::new(index, model.clone()));
        let toolbox = Arc::new(ToolBox::new(dir));
        let tools = Arc::new(ToolRegistry::new(searcher, toolbox));
        Agent::new(model, tools)
    }

    #[tokio::test]
    async fn respond_tool_call_terminates_with_its_answer() {
        let dir = tempfile::tempdir().unwrap();
        let a = agent(
            vec![r#"{"name": "respond", "params": {"answer": "there are 2 pdfs"}}"#],
            dir.path(),
        );
        let (text, sources) = a.run("how many pdfs", "how many pdfs", "count", &[], None, None).await;
        assert_eq!(text, "there are 2 pdfs");
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn no_tool_call_at_step_zero_falls_back_to_router() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        let a = agent(
            vec![
                "I'm not sure, let me think about that.",
                r#"{"name": "respond", "params": {"answer": "you have 2 pdfs"}}"#,
            ],
            dir.path(),
        );
        let (text, _) = a
            .run("how many PDF files do I have?", "how many PDF files do I have?", "count", &[], None, None)
            .await;
        assert_eq!(text, "you have 2 pdfs");
    }

    #[tokio::test]
    async fn loop_exhaustion_forces_a_final_answer_call() {
        let dir = tempfile::tempdir().unwrap();
        let a = agent(
            vec![
                r#"{"name": "count_files", "params": {}}"#,
                r#"{"name": "count_files", "params": {}}"#,
                r#"{"name": "count_files", "params": {}}"#,
                r#"{"name": "count_files", "params": {}}"#,
                r#"{"name": "count_files", "params": {}}"#,
                "final answer after exhausting the budget",
            ],
            dir.path(),
        );
        let (text, _) = a.run("how many files", "how many files", "count", &[], None, None).await;
        assert_eq!(text, "final answer after exhausting the budget");
    }

    #[tokio::test]
    async fn unknown_tool_name_is_ignored_as_no_tool_call() {
        let dir = tempfile::tempdir().unwrap();
        let a = agent(
            vec![r#"{"name": "delete_everything", "params": {}}"#],
            dir.path(),
        );
        // step 0 with no recognized tool call falls through to the router,
        // whose default is semantic_search; run() still terminates after
        // one more step budget is spent rather than hanging.
        let (text, _) = a.run("xyz", "xyz", "factual", &[], None, None).await;
        assert!(!text.is_empty());
    }
}
