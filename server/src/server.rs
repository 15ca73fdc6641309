use crate::config::ServerConfig;
use crate::dir_id;
use crate::directory::{DirectoryEntry, DirectoryState};
use crate::registry;
use crate::sink::Sink;
use crate::stats;
use crate::summary;
use manole_agent::{Agent, AgentStep};
use manole_captioner::{ImageCaptioner, StopFlag};
use manole_extractor::{Extractor, FileReader, PlainTextExtractor};
use manole_indexer::{start_watcher, KreuzbergIndexer};
use manole_model::{ModelHandle, NullModel};
use manole_protocol::EventType;
use manole_rewriter::QueryRewriter;
use manole_searcher::Searcher;
use manole_tools::ToolRegistry;
use manole_toolbox::ToolBox;
use manole_vector_store::{HashEmbedder, InMemoryVectorIndex, VectorIndex};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// The model and its companion rewriter are constructed together, lazily,
/// on the first `init` call (spec.md §4.15: "Load the shared `Model` on
/// first call only").
#[derive(Clone)]
struct Loaded {
    model: ModelHandle,
    rewriter: Arc<QueryRewriter>,
}

/// Top-level dispatcher (spec.md §4.15). One instance per process. Owns
/// the shared `Model`/`QueryRewriter` and the `dir_id → DirectoryEntry`
/// map; the map itself is only ever touched by the request-handling
/// loop, never by a background worker (spec.md §5).
pub struct Server {
    config: ServerConfig,
    sink: Arc<Sink>,
    started_at: Instant,
    loaded: Mutex<Option<Loaded>>,
    directories: HashMap<String, Arc<DirectoryEntry>>,
    /// The directory a bare (no `directoryId`) `query` targets: the most
    /// recently `init`-ed directory. Disambiguating "no id" any other
    /// way (e.g. "all ready directories") would silently change which
    /// directory answers a query across `init` calls from the same
    /// client session, which is worse than requiring an explicit id
    /// once more than one directory is open.
    last_directory: Option<String>,
    debug: bool,
    pub running: bool,
}

impl Server {
    pub fn new(config: ServerConfig, sink: Arc<Sink>) -> Self {
        Self {
            config,
            sink,
            started_at: Instant::now(),
            loaded: Mutex::new(None),
            directories: HashMap::new(),
            last_directory: None,
            debug: false,
            running: true,
        }
    }

    /// Test/embedding seam: pre-seed the shared model instead of letting
    /// the first `init` build one from `config.model_path`.
    #[cfg(test)]
    pub fn with_model(config: ServerConfig, sink: Arc<Sink>, model: ModelHandle) -> Self {
        let server = Self::new(config, sink);
        *server
            .loaded
            .try_lock()
            .expect("uncontended at construction") = Some(Loaded {
            rewriter: Arc::new(QueryRewriter::new(model.clone())),
            model,
        });
        server
    }

    async fn ensure_loaded(&self) -> Loaded {
        let mut guard = self.loaded.lock().await;
        if let Some(loaded) = guard.as_ref() {
            return loaded.clone();
        }
        self.sink.event(EventType::Status, json!({"state": "loading_model"}));
        let model = build_model(&self.config);
        let loaded = Loaded {
            rewriter: Arc::new(QueryRewriter::new(model.clone())),
            model,
        };
        *guard = Some(loaded.clone());
        loaded
    }

    /// Dispatch one request. Every branch returns a frame — there is no
    /// panic path a handler can take that would need to be caught
    /// separately, so "per-handler exceptions are caught" (spec.md
    /// §4.15) is satisfied by handlers never propagating a Rust error
    /// past their own boundary instead of by an explicit catch.
    pub async fn dispatch(&mut self, id: i64, method: &str, params: Value) -> manole_protocol::OutboundFrame {
        match method {
            "ping" => self.handle_ping(id),
            "init" => self.handle_init(id, params).await,
            "query" => self.handle_query(id, params).await,
            "remove_directory" => self.handle_remove_directory(id, params).await,
            "reindex" => self.handle_reindex(id, params).await,
            "getFileGraph" => self.handle_get_file_graph(id, params).await,
            "toggle_debug" => self.handle_toggle_debug(id),
            "list_indexes" => self.handle_list_indexes(id).await,
            "shutdown" => self.handle_shutdown(id),
            other => self.error_response(id, &format!("unknown method: {other}")),
        }
    }

    fn error_response(&self, id: i64, message: &str) -> manole_protocol::OutboundFrame {
        manole_protocol::OutboundFrame::response(id, EventType::Error, json!({"message": message}))
    }

    fn handle_ping(&self, id: i64) -> manole_protocol::OutboundFrame {
        let state = if self.directories.is_empty() {
            "not_initialized"
        } else {
            "ready"
        };
        manole_protocol::OutboundFrame::response(
            id,
            EventType::Result,
            json!({"state": state, "uptime": self.started_at.elapsed().as_secs_f64()}),
        )
    }

    fn handle_toggle_debug(&mut self, id: i64) -> manole_protocol::OutboundFrame {
        self.debug = !self.debug;
        log::set_max_level(if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        });
        manole_protocol::OutboundFrame::response(id, EventType::Result, json!({"debug": self.debug}))
    }

    fn handle_shutdown(&mut self, id: i64) -> manole_protocol::OutboundFrame {
        self.running = false;
        manole_protocol::OutboundFrame::response(id, EventType::Result, json!({"status": "shutting_down"}))
    }

    async fn handle_list_indexes(&self, id: i64) -> manole_protocol::OutboundFrame {
        let dirs = registry::list_indexes(&self.config.registry_path).await;
        let indexes: Vec<String> = dirs.iter().map(|p| p.display().to_string()).collect();
        manole_protocol::OutboundFrame::response(id, EventType::Result, json!({"indexes": indexes}))
    }

    async fn handle_init(&mut self, id: i64, params: Value) -> manole_protocol::OutboundFrame {
        let Some(data_dir_str) = params.get("dataDir").and_then(Value::as_str) else {
            return self.error_response(id, "init requires a \"dataDir\" string");
        };
        let data_dir = PathBuf::from(data_dir_str);
        if !data_dir.is_dir() {
            return self.error_response(id, &format!("not a directory: {}", data_dir.display()));
        }
        let reuse = params.get("reuse").and_then(Value::as_bool).unwrap_or(true);

        let this_dir_id = dir_id::derive(&data_dir);
        self.sink.event(
            EventType::DirectoryUpdate,
            json!({"directoryId": this_dir_id, "state": "indexing"}),
        );

        let loaded = self.ensure_loaded().await;

        let index_dir = data_dir.join(".neurofind").join("index");
        let saved_index_path = index_dir.join("documents.leann");
        let concrete_index = if reuse && saved_index_path.exists() {
            match InMemoryVectorIndex::load(&index_dir, Arc::new(HashEmbedder::default())).await {
                Ok(index) => Arc::new(index),
                Err(err) => {
                    log::warn!("failed to load existing index at {index_dir:?}: {err}, starting empty");
                    Arc::new(InMemoryVectorIndex::with_hash_embedder())
                }
            }
        } else {
            Arc::new(InMemoryVectorIndex::with_hash_embedder())
        };
        let index: Arc<dyn VectorIndex> = concrete_index.clone();

        let extractor: Arc<dyn Extractor> = Arc::new(PlainTextExtractor::new());
        let indexer = Arc::new(KreuzbergIndexer::new(&data_dir, &index_dir, index.clone(), extractor));

        if let Err(err) = indexer.build(!reuse).await {
            self.sink.event(
                EventType::DirectoryUpdate,
                json!({"directoryId": this_dir_id, "state": "error", "error": err.to_string()}),
            );
            return self.error_response(id, &format!("index build failed: {err}"));
        }

        if let Err(err) = concrete_index.save(&index_dir).await {
            log::warn!("failed to persist index at {index_dir:?}: {err}");
        }

        let toolbox = Arc::new(ToolBox::new(&data_dir));
        let file_reader = Arc::new(FileReader::new());
        let searcher = Arc::new(
            Searcher::new(index.clone(), loaded.model.clone())
                .with_fallback(file_reader, toolbox.clone()),
        );
        let tools = Arc::new(ToolRegistry::new(searcher.clone(), toolbox.clone()));
        let agent = Arc::new(Agent::new(loaded.model.clone(), tools));

        let entry = Arc::new(DirectoryEntry::new(
            this_dir_id.clone(),
            data_dir.clone(),
            this_dir_id.clone(),
            concrete_index,
            index.clone(),
            indexer.clone(),
            searcher.clone(),
            agent,
            toolbox,
        ));
        entry.set_state(DirectoryState::Ready).await;

        let dir_stats = stats::collect(&data_dir);
        entry.set_stats(dir_stats.clone()).await;

        self.directories.insert(this_dir_id.clone(), entry.clone());
        self.last_directory = Some(this_dir_id.clone());

        self.sink.event(
            EventType::DirectoryUpdate,
            json!({"directoryId": this_dir_id, "state": "ready", "stats": dir_stats}),
        );

        let watcher_handle = start_watcher(indexer, data_dir.clone());
        entry.set_watcher(watcher_handle).await;

        if self.config.vision_model_path.is_some() {
            let stop = StopFlag::new();
            entry.set_captioner_stop(stop.clone()).await;
            let captioner = ImageCaptioner::new(this_dir_id.clone(), data_dir.clone(), index, loaded.model.clone());
            let sink = self.sink.clone();
            tokio::spawn(async move {
                let on_event = move |data: Value| sink.event(EventType::CaptioningProgress, data);
                captioner.run(&stop, Some(&on_event)).await;
            });
        }

        {
            let searcher = searcher.clone();
            let model = loaded.model.clone();
            let sink = self.sink.clone();
            let entry = entry.clone();
            let dir_id_for_summary = this_dir_id.clone();
            let stats_for_summary = dir_stats.clone();
            tokio::spawn(async move {
                if let Some(text) = summary::synthesize(&searcher, &model).await {
                    entry.set_summary(text.clone()).await;
                    sink.event(
                        EventType::DirectoryUpdate,
                        json!({
                            "directoryId": dir_id_for_summary,
                            "state": "ready",
                            "stats": stats_for_summary,
                            "summary": text,
                        }),
                    );
                }
            });
        }

        if let Err(err) = registry::record(&self.config.registry_path, &data_dir).await {
            log::warn!("failed to record {data_dir:?} in the directory registry: {err}");
        }

        manole_protocol::OutboundFrame::response(
            id,
            EventType::Result,
            json!({"status": "ready", "directoryId": this_dir_id, "indexName": this_dir_id}),
        )
    }

    async fn handle_remove_directory(&mut self, id: i64, params: Value) -> manole_protocol::OutboundFrame {
        let Some(dir_id) = params.get("directoryId").and_then(Value::as_str) else {
            return self.error_response(id, "remove_directory requires a \"directoryId\" string");
        };
        let Some(entry) = self.directories.remove(dir_id) else {
            return self.error_response(id, &format!("unknown directory: {dir_id}"));
        };
        entry.shutdown().await;
        if self.last_directory.as_deref() == Some(dir_id) {
            self.last_directory = None;
        }
        manole_protocol::OutboundFrame::response(id, EventType::Result, json!({"status": "removed", "directoryId": dir_id}))
    }

    async fn handle_reindex(&mut self, id: i64, params: Value) -> manole_protocol::OutboundFrame {
        let Some(dir_id) = params.get("directoryId").and_then(Value::as_str).map(str::to_string) else {
            return self.error_response(id, "reindex requires a \"directoryId\" string");
        };
        let Some(entry) = self.directories.get(&dir_id) else {
            return self.error_response(id, &format!("unknown directory: {dir_id}"));
        };
        entry.invalidate_file_graph().await;
        let data_dir = entry.path.clone();

        if let Some(old) = self.directories.remove(&dir_id) {
            old.shutdown().await;
        }
        self.handle_init(id, json!({"dataDir": data_dir.to_string_lossy(), "reuse": true})).await
    }

    async fn handle_get_file_graph(&self, id: i64, params: Value) -> manole_protocol::OutboundFrame {
        let Some(dir_id) = params.get("directoryId").and_then(Value::as_str) else {
            return self.error_response(id, "getFileGraph requires a \"directoryId\" string");
        };
        let Some(entry) = self.directories.get(dir_id) else {
            return self.error_response(id, &format!("unknown directory: {dir_id}"));
        };
        if let Some(graph) = entry.cached_file_graph().await {
            return manole_protocol::OutboundFrame::response(
                id,
                EventType::Result,
                json!({"nodes": graph.nodes, "edges": graph.edges}),
            );
        }
        let graph = manole_file_graph::compute(&entry.path, entry.index.as_ref());
        entry.set_file_graph(graph.clone()).await;
        manole_protocol::OutboundFrame::response(
            id,
            EventType::Result,
            json!({"nodes": graph.nodes, "edges": graph.edges}),
        )
    }

    async fn handle_query(&mut self, id: i64, params: Value) -> manole_protocol::OutboundFrame {
        let Some(text) = params.get("text").and_then(Value::as_str).filter(|t| !t.trim().is_empty()) else {
            return self.error_response(id, "query requires a non-empty \"text\" string");
        };
        let search_all = params.get("searchAll").and_then(Value::as_bool).unwrap_or(false);
        let requested_dir_id = params.get("directoryId").and_then(Value::as_str);

        if self.directories.is_empty() {
            return self.error_response(id, "not initialized: call init before query");
        }

        if search_all {
            return self.handle_query_all(id, text).await;
        }

        let dir_id = match requested_dir_id.or(self.last_directory.as_deref()) {
            Some(dir_id) => dir_id.to_string(),
            None => return self.error_response(id, "no directoryId given and no directory initialized"),
        };
        let Some(entry) = self.directories.get(&dir_id).cloned() else {
            return self.error_response(id, &format!("unknown directory: {dir_id}"));
        };
        match entry.state().await {
            DirectoryState::Ready => {}
            other => {
                return self.error_response(id, &format!("directory not ready: {}", other.as_str()));
            }
        }

        let loaded = self.ensure_loaded().await;
        let (answer, raw_sources) = self.run_query(&loaded, &entry, text, Some(id)).await;
        entry.push_turn(text, &answer).await;
        let sources: Vec<String> = raw_sources.iter().map(|s| resolve_source(&entry, s)).collect();

        manole_protocol::OutboundFrame::response(id, EventType::Result, json!({"text": answer, "sources": sources}))
    }

    async fn handle_query_all(&mut self, id: i64, text: &str) -> manole_protocol::OutboundFrame {
        let loaded = self.ensure_loaded().await;
        let mut dir_ids: Vec<String> = self.directories.keys().cloned().collect();
        dir_ids.sort();

        let mut blocks = Vec::new();
        let mut sources = Vec::new();
        for dir_id in dir_ids {
            let entry = self.directories.get(&dir_id).cloned().expect("dir_id came from this map");
            if entry.state().await != DirectoryState::Ready {
                continue;
            }
            let (answer, raw_sources) = self.run_query(&loaded, &entry, text, None).await;
            entry.push_turn(text, &answer).await;
            let folder_name = entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| entry.path.display().to_string());
            blocks.push(format!("[{folder_name}]\n{answer}"));
            sources.extend(raw_sources.iter().map(|s| resolve_source(&entry, s)));
        }

        manole_protocol::OutboundFrame::response(
            id,
            EventType::Result,
            json!({"text": blocks.join("\n\n"), "sources": sources}),
        )
    }

    /// Rewrites, then runs the agent loop. `request_id` is `Some` only
    /// for a single-directory, streaming query; `searchAll` passes
    /// `None` so no `token`/`agent_step` events are emitted (spec.md
    /// §4.15: "`searchAll=true` ... non-streaming").
    async fn run_query(
        &self,
        loaded: &Loaded,
        entry: &DirectoryEntry,
        raw_query: &str,
        request_id: Option<i64>,
    ) -> (String, Vec<String>) {
        let history = entry.history().await;
        let context = recent_assistant_context(&history);
        let rewrite = loaded
            .rewriter
            .rewrite(raw_query, context.as_deref())
            .await;

        let sink = self.sink.clone();
        let token_cb = request_id.map(|id| {
            let sink = sink.clone();
            move |delta: &str| sink.streaming(id, EventType::Token, json!({"text": delta}))
        });
        let on_token: Option<&(dyn Fn(&str) + Send + Sync)> =
            token_cb.as_ref().map(|f| f as &(dyn Fn(&str) + Send + Sync));

        let step_cb = request_id.map(|id| {
            let sink = sink.clone();
            move |step: &AgentStep| {
                sink.streaming(
                    id,
                    EventType::AgentStep,
                    json!({"step": step.step, "tool": step.tool, "params": step.params}),
                )
            }
        });
        let on_step: Option<&(dyn Fn(&AgentStep) + Send + Sync)> =
            step_cb.as_ref().map(|f| f as &(dyn Fn(&AgentStep) + Send + Sync));

        entry
            .agent
            .run(
                raw_query,
                &rewrite.resolved_query,
                rewrite.intent.as_str(),
                &history,
                on_token,
                on_step,
            )
            .await
    }
}

/// The `Model` port is wired in; the actual local-inference backend is
/// out of scope (spec.md §1). A `model_path` is accepted and recorded
/// but resolves to a placeholder `NullModel` until a real backend is
/// linked in.
fn build_model(config: &ServerConfig) -> ModelHandle {
    if let Some(path) = &config.model_path {
        log::warn!("model_path={path:?} configured, but this build has no local-inference backend wired in; using a placeholder model");
    }
    ModelHandle::new(Arc::new(NullModel::with_reply("")))
}

/// Context passed to the `QueryRewriter`: the last few assistant turns,
/// transcript-style (spec.md §4.15: "the last few assistant turns of
/// that directory's history").
fn recent_assistant_context(history: &[manole_model::ChatMessage]) -> Option<String> {
    if history.is_empty() {
        return None;
    }
    let tail_start = history.len().saturating_sub(manole_agent::MAX_HISTORY_MESSAGES);
    let context: String = history[tail_start..]
        .iter()
        .map(|m| format!("{:?}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    (!context.is_empty()).then_some(context)
}

/// Resolve a source filename to an absolute path: `join(data_dir, name)`
/// first, then a filename walk under the data directory, else the raw
/// name unchanged (spec.md §4.15).
fn resolve_source(entry: &DirectoryEntry, name: &str) -> String {
    let direct = entry.path.join(name);
    if direct.exists() {
        return direct.to_string_lossy().to_string();
    }
    if let Some(found) = entry.toolbox.grep_paths(name).into_iter().next() {
        return found.to_string_lossy().to_string();
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use manole_model::{ChatMessage as Msg, Model, ModelError, OnToken};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedModel {
        replies: Vec<String>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: replies.into_iter().map(str::to_string).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate(
            &self,
            _messages: &[Msg],
            _max_tokens: usize,
            _stream: bool,
            _on_token: Option<OnToken<'_>>,
        ) -> std::result::Result<String, ModelError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.replies.get(i).cloned().unwrap_or_default())
        }

        async fn caption_image(&self, _image_bytes: &[u8]) -> std::result::Result<String, ModelError> {
            Ok(String::new())
        }
    }

    fn test_config() -> (ServerConfig, tempfile::TempDir) {
        let home = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            model_path: None,
            vision_model_path: None,
            registry_path: home.path().join("known_directories.json"),
        };
        (config, home)
    }

    #[tokio::test]
    async fn ping_reflects_whether_any_directory_is_initialized() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));

        let frame = server.dispatch(1, "ping", json!({})).await;
        assert_eq!(frame.data["state"], "not_initialized");

        let data_dir = tempfile::tempdir().unwrap();
        std::fs::write(data_dir.path().join("a.txt"), "hello world").unwrap();
        server
            .dispatch(2, "init", json!({"dataDir": data_dir.path().to_string_lossy(), "reuse": false}))
            .await;

        let frame = server.dispatch(3, "ping", json!({})).await;
        assert_eq!(frame.data["state"], "ready");
    }

    #[tokio::test]
    async fn init_rejects_a_path_that_is_not_a_directory() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));
        let frame = server
            .dispatch(1, "init", json!({"dataDir": "/definitely/not/a/real/path"}))
            .await;
        assert_eq!(frame.kind, EventType::Error);
    }

    #[tokio::test]
    async fn init_records_the_directory_so_list_indexes_can_find_it() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));

        let data_dir = tempfile::tempdir().unwrap();
        std::fs::write(data_dir.path().join("a.txt"), "hello world").unwrap();
        let init_frame = server
            .dispatch(1, "init", json!({"dataDir": data_dir.path().to_string_lossy(), "reuse": false}))
            .await;
        assert_eq!(init_frame.data["status"], "ready");

        let list_frame = server.dispatch(2, "list_indexes", json!({})).await;
        let indexes = list_frame.data["indexes"].as_array().unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0], data_dir.path().to_string_lossy().to_string());
    }

    #[tokio::test]
    async fn query_runs_the_rewriter_then_the_agent_and_returns_its_answer() {
        let (config, _home) = test_config();
        let model = ModelHandle::new(Arc::new(ScriptedModel::new(vec![
            r#"{"intent": "factual", "search_query": "q", "resolved_query": "q"}"#,
            r#"{"name": "respond", "params": {"answer": "there are 2 files"}}"#,
        ])));
        let mut server = Server::with_model(config, Arc::new(Sink::new()), model);

        let data_dir = tempfile::tempdir().unwrap();
        std::fs::write(data_dir.path().join("a.txt"), "first file").unwrap();
        std::fs::write(data_dir.path().join("b.txt"), "second file").unwrap();
        server
            .dispatch(1, "init", json!({"dataDir": data_dir.path().to_string_lossy(), "reuse": false}))
            .await;

        let frame = server.dispatch(2, "query", json!({"text": "how many files?"})).await;
        assert_eq!(frame.data["text"], "there are 2 files");
    }

    #[tokio::test]
    async fn query_with_an_unknown_directory_id_is_an_error() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));

        let data_dir = tempfile::tempdir().unwrap();
        std::fs::write(data_dir.path().join("a.txt"), "hello").unwrap();
        server
            .dispatch(1, "init", json!({"dataDir": data_dir.path().to_string_lossy(), "reuse": false}))
            .await;

        let frame = server
            .dispatch(2, "query", json!({"text": "hi", "directoryId": "no-such-directory"}))
            .await;
        assert_eq!(frame.kind, EventType::Error);
    }

    #[tokio::test]
    async fn query_before_any_init_is_an_error() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));
        let frame = server.dispatch(1, "query", json!({"text": "hi"})).await;
        assert_eq!(frame.kind, EventType::Error);
    }

    #[tokio::test]
    async fn remove_directory_then_query_reports_not_initialized() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));

        let data_dir = tempfile::tempdir().unwrap();
        std::fs::write(data_dir.path().join("a.txt"), "hello").unwrap();
        let init_frame = server
            .dispatch(1, "init", json!({"dataDir": data_dir.path().to_string_lossy(), "reuse": false}))
            .await;
        let dir_id = init_frame.data["directoryId"].as_str().unwrap().to_string();

        let remove_frame = server
            .dispatch(2, "remove_directory", json!({"directoryId": dir_id}))
            .await;
        assert_eq!(remove_frame.data["status"], "removed");

        let frame = server.dispatch(3, "query", json!({"text": "hi"})).await;
        assert_eq!(frame.kind, EventType::Error);
    }

    #[tokio::test]
    async fn get_file_graph_returns_nodes_for_an_initialized_directory() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));

        let data_dir = tempfile::tempdir().unwrap();
        std::fs::write(data_dir.path().join("a.txt"), "some content about budgets").unwrap();
        let init_frame = server
            .dispatch(1, "init", json!({"dataDir": data_dir.path().to_string_lossy(), "reuse": false}))
            .await;
        let dir_id = init_frame.data["directoryId"].as_str().unwrap().to_string();

        let frame = server
            .dispatch(2, "getFileGraph", json!({"directoryId": dir_id}))
            .await;
        assert!(frame.data["nodes"].as_array().unwrap().len() >= 1);
    }

    #[tokio::test]
    async fn toggle_debug_flips_on_each_call() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));
        let first = server.dispatch(1, "toggle_debug", json!({})).await;
        assert_eq!(first.data["debug"], true);
        let second = server.dispatch(2, "toggle_debug", json!({})).await;
        assert_eq!(second.data["debug"], false);
    }

    #[tokio::test]
    async fn shutdown_stops_the_dispatch_loop() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));
        assert!(server.running);
        server.dispatch(1, "shutdown", json!({})).await;
        assert!(!server.running);
    }

    #[tokio::test]
    async fn unknown_method_is_an_error_and_does_not_stop_the_loop() {
        let (config, _home) = test_config();
        let mut server = Server::new(config, Arc::new(Sink::new()));
        let frame = server.dispatch(1, "not_a_real_method", json!({})).await;
        assert_eq!(frame.kind, EventType::Error);
        assert!(server.running);
    }
}
