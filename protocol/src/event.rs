use serde::Serialize;
use serde_json::Value;

/// Outbound frame `type`, per spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Result,
    Token,
    AgentStep,
    Error,
    Status,
    Progress,
    Log,
    DirectoryUpdate,
    FileGraph,
    CaptioningProgress,
}

/// One line on stdout: `{id, type, data}`.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub data: Value,
}

impl OutboundFrame {
    /// Terminal response to a request (`result` or `error`), tagged
    /// with the originating request id.
    pub fn response(id: i64, kind: EventType, data: Value) -> Self {
        Self {
            id: Some(id),
            kind,
            data,
        }
    }

    /// A streaming frame belonging to an in-flight request (`token`,
    /// `agent_step`) — still tagged with the request id so the client
    /// can demultiplex concurrent requests.
    pub fn streaming(id: i64, kind: EventType, data: Value) -> Self {
        Self {
            id: Some(id),
            kind,
            data,
        }
    }

    /// An unsolicited event with no originating request (`status`,
    /// `progress`, `log`, `directory_update`, `captioning_progress`).
    pub fn event(kind: EventType, data: Value) -> Self {
        Self {
            id: None,
            kind,
            data,
        }
    }
}
