use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum number of events retained; older ones are evicted first.
pub const EVENT_LOG_CAPACITY: usize = 100;

/// Longest user-supplied text kept verbatim in logs.
pub const LOG_PREVIEW_CHARS: usize = 120;

/// Category of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Connect,
    Disconnect,
    Quit,
    GetBoard,
    Post,
    PostError,
    Error,
    Server,
    Warning,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Connect => "CONNECT",
            EventKind::Disconnect => "DISCONNECT",
            EventKind::Quit => "QUIT",
            EventKind::GetBoard => "GET_BOARD",
            EventKind::Post => "POST",
            EventKind::PostError => "POST_ERROR",
            EventKind::Error => "ERROR",
            EventKind::Server => "SERVER",
            EventKind::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the observability log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub message: String,
    /// Wire text of the request that triggered the event, when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Bounded FIFO of events.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<Event>,
    capacity: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }

    /// A capacity of zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: Event) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Render client text on a single line for logs, truncated to
/// [`LOG_PREVIEW_CHARS`] characters.
pub fn log_preview(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(LOG_PREVIEW_CHARS + 3));
    for (count, ch) in text.chars().enumerate() {
        if count == LOG_PREVIEW_CHARS {
            out.push_str("...");
            break;
        }
        out.extend(ch.escape_debug());
    }
    out
}
