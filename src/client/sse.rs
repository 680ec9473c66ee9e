//! Incremental parser for server-push event streams.
//!
//! Parses `text/event-stream` framing from a byte stream where a complete
//! event may not arrive at once. Bytes accumulate in a buffer; complete
//! lines are consumed as they appear and an event is emitted at each blank
//! line. Fragmentation at any byte boundary is handled, including a CRLF
//! split across chunks.
//!
//! Recognized fields: `data:` (multiple lines join with `\n`), `id:` (the
//! record cursor), `event:`, `retry:` (server-suggested reconnect delay in
//! milliseconds). Comment lines (leading `:`) are keep-alives and are
//! ignored.

use bytes::{Buf, BytesMut};

/// One parsed server-push event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// Event identifier; equals the record's cursor for this service.
    pub id: Option<String>,
    /// Event type, if the server named one.
    pub event: Option<String>,
    /// Payload, shaped like one element of a collection's records array.
    pub data: String,
    /// Server-suggested reconnect delay in milliseconds.
    pub retry: Option<u64>,
}

/// Incremental event-stream parser.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: BytesMut,
    id: Option<String>,
    event: Option<String>,
    data_lines: Vec<String>,
    retry: Option<u64>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes to the parser, returning any events completed by this
    /// chunk. Partial trailing input stays buffered for the next feed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(line) = self.take_line() {
            if line.is_empty() {
                if let Some(event) = self.flush() {
                    events.push(event);
                }
            } else {
                self.consume_field(&line);
            }
        }
        events
    }

    fn take_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line_end = newline;
        if line_end > 0 && self.buffer[line_end - 1] == b'\r' {
            line_end -= 1;
        }
        let line = String::from_utf8_lossy(&self.buffer[..line_end]).into_owned();
        self.buffer.advance(newline + 1);
        Some(line)
    }

    fn consume_field(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data_lines.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "retry" => {
                if let Ok(millis) = value.parse() {
                    self.retry = Some(millis);
                }
            }
            _ => {}
        }
    }

    fn flush(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty()
            && self.id.is_none()
            && self.event.is_none()
            && self.retry.is_none()
        {
            return None;
        }
        Some(SseEvent {
            id: self.id.take(),
            event: self.event.take(),
            data: std::mem::take(&mut self.data_lines).join("\n"),
            retry: self.retry.take(),
        })
    }
}
