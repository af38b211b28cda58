use serde::{Deserialize, Serialize};

use crate::delimiters::Delimiters;
use crate::error::ParseError;

pub const GET_BOARD: &str = "GET_BOARD";
pub const POST: &str = "POST";
pub const QUIT: &str = "QUIT";

/// One `author, title, message` triple as carried on the wire.
///
/// Author and title may be empty (anonymous, untitled); the parser never
/// produces a payload with an empty message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub author: String,
    pub title: String,
    pub message: String,
}

impl PostPayload {
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            message: message.into(),
        }
    }
}

/// A parsed client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the board; an empty filter matches everything.
    GetBoard {
        author_filter: String,
        title_filter: String,
    },
    /// Append one or more posts atomically.
    Post { posts: Vec<PostPayload> },
    Quit,
    Invalid(ParseError),
}

impl Command {
    /// The command word, or `None` for an invalid frame.
    pub fn word(&self) -> Option<&'static str> {
        match self {
            Command::GetBoard { .. } => Some(GET_BOARD),
            Command::Post { .. } => Some(POST),
            Command::Quit => Some(QUIT),
            Command::Invalid(_) => None,
        }
    }

    /// Encode as complete request wire text, terminator included.
    ///
    /// `Invalid` has no wire form and encodes to the terminator alone, which
    /// the server answers with `INVALID_COMMAND`.
    pub fn encode(&self, delims: &Delimiters) -> String {
        let fd = delims.field();
        let mut out = String::new();
        match self {
            Command::GetBoard {
                author_filter,
                title_filter,
            } => {
                out.push_str(GET_BOARD);
                out.push_str(fd);
                out.push_str(author_filter);
                out.push_str(fd);
                out.push_str(title_filter);
            }
            Command::Post { posts } => {
                out.push_str(POST);
                push_triples(&mut out, posts, delims);
            }
            Command::Quit => out.push_str(QUIT),
            Command::Invalid(_) => {}
        }
        out.push_str(delims.terminator());
        out
    }
}

/// Append `posts` as `FD a FD t FD m (SEP a FD t FD m)*`.
pub(crate) fn push_triples(out: &mut String, posts: &[PostPayload], delims: &Delimiters) {
    for (i, post) in posts.iter().enumerate() {
        out.push_str(if i == 0 {
            delims.field()
        } else {
            delims.separator()
        });
        out.push_str(&post.author);
        out.push_str(delims.field());
        out.push_str(&post.title);
        out.push_str(delims.field());
        out.push_str(&post.message);
    }
}
