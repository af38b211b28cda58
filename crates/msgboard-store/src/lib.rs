//! Shared in-memory board state for msgboard.
//!
//! [`BoardStore`] is the single source of truth mutated by every connection.
//! Posts, the event log and the live-connection set each sit behind their
//! own lock and no operation holds two of them at once.

pub mod error;
pub mod event;
pub mod handlers;
pub mod post;
pub mod store;
pub mod view;

pub use error::{ApplyError, Result};
pub use event::{log_preview, Event, EventKind, EventLog, EVENT_LOG_CAPACITY, LOG_PREVIEW_CHARS};
pub use handlers::{apply_post, matches_filters, query_board};
pub use post::{ClientId, Post};
pub use store::BoardStore;
pub use view::{BoardStats, DashboardView};
