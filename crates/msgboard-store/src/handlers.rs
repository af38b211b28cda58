//! Command handlers shared by every connection.

use msgboard_protocol::{Delimiters, PostPayload, Response};
use tracing::debug;

use crate::error::{ApplyError, Result};
use crate::post::{ClientId, Post};
use crate::store::BoardStore;

/// Store a POST batch, all or nothing.
pub fn apply_post(
    store: &BoardStore,
    posts: Vec<PostPayload>,
    client_id: ClientId,
) -> Result<()> {
    if posts.is_empty() {
        return Err(ApplyError::NoPosts);
    }
    let batch: Vec<Post> = posts
        .into_iter()
        .map(|payload| Post::from_payload(payload, client_id))
        .collect();
    let added = store.append_posts(batch)?;
    debug!(client_id, added, "posts appended");
    Ok(())
}

/// An empty filter matches everything; otherwise comparison is exact.
pub fn matches_filters(post: &Post, author_filter: &str, title_filter: &str) -> bool {
    (author_filter.is_empty() || post.author == author_filter)
        && (title_filter.is_empty() || post.title == title_filter)
}

/// Serialize the matching posts, oldest first, as a `GET_BOARD` response.
///
/// Matching and serialization both happen under the read lock, so the reply
/// reflects a single consistent view of the board.
pub fn query_board(
    store: &BoardStore,
    author_filter: &str,
    title_filter: &str,
    delims: &Delimiters,
) -> String {
    store.with_posts(|posts| {
        let matches = posts
            .iter()
            .filter(|post| matches_filters(post, author_filter, title_filter))
            .map(Post::to_payload)
            .collect();
        Response::Board(matches).encode(delims)
    })
}
