use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::Utc;
use tracing::debug;

use crate::error::{ApplyError, Result};
use crate::event::{Event, EventKind, EventLog};
use crate::post::{ClientId, Post};

#[derive(Debug, Default)]
struct BoardData {
    posts: Vec<Post>,
    total_received: u64,
}

/// Shared board state, one per server, handed around as `Arc<BoardStore>`.
///
/// Each collection has its own lock. Methods take exactly one of them and
/// release it before returning, so callers never nest locks.
#[derive(Debug)]
pub struct BoardStore {
    board: RwLock<BoardData>,
    events: Mutex<EventLog>,
    connections: Mutex<BTreeSet<ClientId>>,
    total_sent: AtomicU64,
    next_client_id: AtomicU64,
    running: AtomicBool,
}

impl BoardStore {
    pub fn new() -> Self {
        Self {
            board: RwLock::new(BoardData::default()),
            events: Mutex::new(EventLog::new()),
            connections: Mutex::new(BTreeSet::new()),
            total_sent: AtomicU64::new(0),
            next_client_id: AtomicU64::new(1),
            running: AtomicBool::new(true),
        }
    }

    /// Issue a fresh client id. Ids start at 1 and are never reused.
    pub fn next_client_id(&self) -> ClientId {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn register_connection(&self, client_id: ClientId) {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client_id);
    }

    /// Returns `false` if the id was not registered.
    pub fn unregister_connection(&self, client_id: ClientId) -> bool {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&client_id)
    }

    /// Live client ids in ascending order.
    pub fn active_connections(&self) -> Vec<ClientId> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    pub fn active_connection_count(&self) -> usize {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Append a batch under a single write lock.
    ///
    /// Other connections observe either none or all of the batch.
    pub fn append_posts(&self, posts: Vec<Post>) -> Result<usize> {
        if posts.is_empty() {
            return Err(ApplyError::NoPosts);
        }
        let added = posts.len();
        let mut board = self.board.write().unwrap_or_else(PoisonError::into_inner);
        board.posts.extend(posts);
        board.total_received += added as u64;
        Ok(added)
    }

    /// Run `f` over the posts while holding the read lock.
    pub fn with_posts<R>(&self, f: impl FnOnce(&[Post]) -> R) -> R {
        let board = self.board.read().unwrap_or_else(PoisonError::into_inner);
        f(&board.posts)
    }

    /// Copy of every post in arrival order.
    pub fn posts(&self) -> Vec<Post> {
        self.with_posts(<[Post]>::to_vec)
    }

    pub fn post_count(&self) -> usize {
        self.with_posts(<[Post]>::len)
    }

    pub fn total_messages_received(&self) -> u64 {
        self.board
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .total_received
    }

    pub fn total_messages_sent(&self) -> u64 {
        self.total_sent.load(Ordering::Relaxed)
    }

    /// Count one response written to a client.
    pub fn record_sent(&self) {
        self.total_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn log_event(&self, kind: EventKind, message: impl Into<String>, raw: Option<String>) {
        let event = Event {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            raw,
        };
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Flip `running` to false. Returns `true` only for the call that
    /// actually performed the transition.
    pub fn request_shutdown(&self) -> bool {
        self.running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Copy of the board for an external persistence layer.
    pub fn snapshot(&self) -> Vec<Post> {
        self.posts()
    }

    /// Load previously persisted posts into an empty board.
    ///
    /// Client ids issued afterwards are strictly greater than any restored
    /// id. Restored posts do not count towards `total_messages_received`.
    pub fn restore(&self, posts: Vec<Post>) -> Result<usize> {
        if let Some(index) = posts.iter().position(|post| post.message.is_empty()) {
            return Err(ApplyError::EmptyMessage { index });
        }
        let max_id = posts.iter().map(|post| post.client_id).max();
        let restored = posts.len();

        {
            let mut board = self.board.write().unwrap_or_else(PoisonError::into_inner);
            if !board.posts.is_empty() {
                return Err(ApplyError::BoardNotEmpty {
                    count: board.posts.len(),
                });
            }
            board.posts = posts;
        }

        if let Some(max_id) = max_id {
            self.next_client_id
                .fetch_max(max_id.saturating_add(1), Ordering::Relaxed);
        }
        debug!(restored, "board restored");
        Ok(restored)
    }
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}
