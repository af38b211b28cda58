use std::sync::Arc;

use serde::Serialize;

use crate::event::Event;
use crate::post::{ClientId, Post};
use crate::store::BoardStore;

/// Point-in-time counters for dashboards and the CLI summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardStats {
    pub posts: usize,
    pub active_connections: usize,
    pub total_messages_received: u64,
    pub total_messages_sent: u64,
    pub running: bool,
}

/// Read-only window onto a running board for an operator dashboard.
///
/// The only mutating action is [`DashboardView::request_shutdown`].
#[derive(Debug, Clone)]
pub struct DashboardView {
    store: Arc<BoardStore>,
}

impl DashboardView {
    pub fn new(store: Arc<BoardStore>) -> Self {
        Self { store }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.store.posts()
    }

    pub fn events(&self) -> Vec<Event> {
        self.store.events()
    }

    pub fn active_connections(&self) -> Vec<ClientId> {
        self.store.active_connections()
    }

    /// Counters are read one at a time, so they may be mutually skewed by
    /// concurrent traffic.
    pub fn stats(&self) -> BoardStats {
        BoardStats {
            posts: self.store.post_count(),
            active_connections: self.store.active_connection_count(),
            total_messages_received: self.store.total_messages_received(),
            total_messages_sent: self.store.total_messages_sent(),
            running: self.store.is_running(),
        }
    }

    /// Case-insensitive substring search over author, title and message.
    ///
    /// Looser than `GET_BOARD` filtering; meant for interactive browsing.
    pub fn search(&self, needle: &str) -> Vec<Post> {
        let needle = needle.to_lowercase();
        self.store.with_posts(|posts| {
            posts
                .iter()
                .filter(|post| {
                    needle.is_empty()
                        || [&post.author, &post.title, &post.message]
                            .iter()
                            .any(|field| field.to_lowercase().contains(&needle))
                })
                .cloned()
                .collect()
        })
    }

    /// Ask the server to stop; see [`BoardStore::request_shutdown`].
    pub fn request_shutdown(&self) -> bool {
        self.store.request_shutdown()
    }
}
