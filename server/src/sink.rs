use manole_protocol::{serialize_frame, EventType, OutboundFrame};
use serde_json::Value;
use std::io::{self, Stdout, Write};
use std::sync::Mutex;

/// The single writer onto stdout. `send` must be thread-safe (spec.md
/// §5: "mutex around write+flush") since both the I/O thread (request
/// responses, streamed tokens) and every directory's background watcher
/// and captioner write through it concurrently.
pub struct Sink(Mutex<Stdout>);

impl Sink {
    pub fn new() -> Self {
        Self(Mutex::new(io::stdout()))
    }

    fn write_frame(&self, frame: OutboundFrame) {
        let line = match serialize_frame(&frame) {
            Ok(line) => line,
            Err(err) => {
                log::error!("failed to encode outbound frame: {err}");
                return;
            }
        };
        let mut out = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = writeln!(out, "{line}") {
            log::error!("failed to write to stdout: {err}");
            return;
        }
        if let Err(err) = out.flush() {
            log::error!("failed to flush stdout: {err}");
        }
    }

    /// Terminal response to a request.
    pub fn response(&self, id: i64, kind: EventType, data: Value) {
        self.write_frame(OutboundFrame::response(id, kind, data));
    }

    /// A streaming frame tagged with its originating request id
    /// (`token`, `agent_step`).
    pub fn streaming(&self, id: i64, kind: EventType, data: Value) {
        self.write_frame(OutboundFrame::streaming(id, kind, data));
    }

    /// An unsolicited event (`status`, `directory_update`,
    /// `captioning_progress`, ...).
    pub fn event(&self, kind: EventType, data: Value) {
        self.write_frame(OutboundFrame::event(kind, data));
    }

    /// Writes a frame a caller already assembled (the dispatch loop's
    /// per-request response).
    pub fn write_response(&self, frame: OutboundFrame) {
        self.write_frame(frame);
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}
