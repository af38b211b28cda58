use msgboard_protocol::PostPayload;
use serde::{Deserialize, Serialize};

/// Identifier handed to each accepted connection.
pub type ClientId = u64;

/// A stored post. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub author: String,
    pub title: String,
    pub message: String,
    /// Connection that submitted the post.
    pub client_id: ClientId,
}

impl Post {
    pub fn from_payload(payload: PostPayload, client_id: ClientId) -> Self {
        Self {
            author: payload.author,
            title: payload.title,
            message: payload.message,
            client_id,
        }
    }

    /// Wire form; the client id is not transmitted.
    pub fn to_payload(&self) -> PostPayload {
        PostPayload::new(&self.author, &self.title, &self.message)
    }
}
