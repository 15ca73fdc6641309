use crate::stats::DirectoryStats;
use manole_agent::Agent;
use manole_captioner::StopFlag;
use manole_file_graph::FileGraph;
use manole_indexer::{KreuzbergIndexer, WatcherHandle};
use manole_model::ChatMessage;
use manole_searcher::Searcher;
use manole_toolbox::ToolBox;
use manole_vector_store::{InMemoryVectorIndex, VectorIndex};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// `conversation_history` is capped at this many turns (spec.md §4.15:
/// "truncated to 10 entries" — 5 user/assistant pairs).
pub const MAX_HISTORY_ENTRIES: usize = 10;

/// `P3`: `indexing → {ready, error}`, monotonic; once `error`, only a
/// fresh `reindex` can move it back to `ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryState {
    Indexing,
    Ready,
    Error(String),
}

impl DirectoryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryState::Indexing => "indexing",
            DirectoryState::Ready => "ready",
            DirectoryState::Error(_) => "error",
        }
    }
}

/// One initialized data directory: its index, its searcher/agent stack,
/// and the background workers bound to it. The `Server`'s `directories`
/// map is mutated only by the I/O thread (insert on `init`, remove on
/// `remove_directory`); the interior-mutable fields here are the ones
/// background workers and the async summary task are allowed to update
/// (spec.md §5: "background workers... mutate only the entry fields
/// they own").
pub struct DirectoryEntry {
    pub dir_id: String,
    pub path: PathBuf,
    pub index_name: String,
    pub concrete_index: Arc<InMemoryVectorIndex>,
    pub index: Arc<dyn VectorIndex>,
    pub indexer: Arc<KreuzbergIndexer>,
    pub searcher: Arc<Searcher>,
    pub agent: Arc<Agent>,
    pub toolbox: Arc<ToolBox>,

    state: Mutex<DirectoryState>,
    stats: Mutex<Option<DirectoryStats>>,
    summary: Mutex<Option<String>>,
    file_graph: Mutex<Option<FileGraph>>,
    conversation_history: Mutex<Vec<ChatMessage>>,
    watcher_handle: Mutex<Option<WatcherHandle>>,
    captioner_stop: Mutex<Option<StopFlag>>,
}

impl DirectoryEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dir_id: String,
        path: PathBuf,
        index_name: String,
        concrete_index: Arc<InMemoryVectorIndex>,
        index: Arc<dyn VectorIndex>,
        indexer: Arc<KreuzbergIndexer>,
        searcher: Arc<Searcher>,
        agent: Arc<Agent>,
        toolbox: Arc<ToolBox>,
    ) -> Self {
        Self {
            dir_id,
            path,
            index_name,
            concrete_index,
            index,
            indexer,
            searcher,
            agent,
            toolbox,
            state: Mutex::new(DirectoryState::Indexing),
            stats: Mutex::new(None),
            summary: Mutex::new(None),
            file_graph: Mutex::new(None),
            conversation_history: Mutex::new(Vec::new()),
            watcher_handle: Mutex::new(None),
            captioner_stop: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> DirectoryState {
        self.state.lock().await.clone()
    }

    pub async fn set_state(&self, state: DirectoryState) {
        *self.state.lock().await = state;
    }

    pub async fn stats(&self) -> Option<DirectoryStats> {
        self.stats.lock().await.clone()
    }

    pub async fn set_stats(&self, stats: DirectoryStats) {
        *self.stats.lock().await = Some(stats);
    }

    pub async fn summary(&self) -> Option<String> {
        self.summary.lock().await.clone()
    }

    pub async fn set_summary(&self, summary: String) {
        *self.summary.lock().await = Some(summary);
    }

    pub async fn cached_file_graph(&self) -> Option<FileGraph> {
        self.file_graph.lock().await.clone()
    }

    pub async fn set_file_graph(&self, graph: FileGraph) {
        *self.file_graph.lock().await = Some(graph);
    }

    pub async fn invalidate_file_graph(&self) {
        *self.file_graph.lock().await = None;
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.conversation_history.lock().await.clone()
    }

    /// Appends `(user, raw)` and `(assistant, final)`, then truncates to
    /// the last `MAX_HISTORY_ENTRIES` messages (spec.md §4.15).
    pub async fn push_turn(&self, user_text: &str, assistant_text: &str) {
        let mut history = self.conversation_history.lock().await;
        history.push(ChatMessage::user(user_text));
        history.push(ChatMessage::assistant(assistant_text));
        let start = history.len().saturating_sub(MAX_HISTORY_ENTRIES);
        history.drain(..start);
    }

    pub async fn set_watcher(&self, handle: WatcherHandle) {
        *self.watcher_handle.lock().await = Some(handle);
    }

    pub async fn set_captioner_stop(&self, stop: StopFlag) {
        *self.captioner_stop.lock().await = Some(stop);
    }

    /// Stops the watcher and the captioner and joins the watcher task.
    /// Called on `remove_directory` (spec.md §4.15).
    pub async fn shutdown(&self) {
        if let Some(stop) = self.captioner_stop.lock().await.take() {
            stop.stop();
        }
        if let Some(handle) = self.watcher_handle.lock().await.take() {
            handle.join().await;
        }
    }
}
