use crate::command::{push_triples, PostPayload, GET_BOARD, QUIT};
use crate::delimiters::Delimiters;
use crate::error::ParseError;
use crate::parser::{tokenize, triples};

pub const POST_OK: &str = "POST_OK";
pub const POST_ERROR: &str = "POST_ERROR";
pub const INVALID_COMMAND: &str = "INVALID_COMMAND";
pub const SERVER: &str = "SERVER";

const GOODBYE_FIELDS: [&str; 3] = ["SERVER", "BYE!!!", "Server says: BYE!!!"];
const SHUTDOWN_FIELDS: [&str; 2] = ["SHUTDOWN", "Server is shutting down"];

/// Leading word of a server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseWord {
    GetBoard,
    PostOk,
    PostError,
    InvalidCommand,
    Quit,
    Server,
}

impl ResponseWord {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseWord::GetBoard => GET_BOARD,
            ResponseWord::PostOk => POST_OK,
            ResponseWord::PostError => POST_ERROR,
            ResponseWord::InvalidCommand => INVALID_COMMAND,
            ResponseWord::Quit => QUIT,
            ResponseWord::Server => SERVER,
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            GET_BOARD => Some(ResponseWord::GetBoard),
            POST_OK => Some(ResponseWord::PostOk),
            POST_ERROR => Some(ResponseWord::PostError),
            INVALID_COMMAND => Some(ResponseWord::InvalidCommand),
            QUIT => Some(ResponseWord::Quit),
            SERVER => Some(ResponseWord::Server),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResponseWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Matching posts, oldest first.
    Board(Vec<PostPayload>),
    PostOk,
    PostError(String),
    InvalidCommand(String),
    /// Acknowledges `QUIT`; the server closes the connection afterwards.
    Goodbye,
    /// Broadcast to every connected client when the server stops.
    ShutdownNotice,
}

impl Response {
    /// Reply for a frame that failed to parse.
    ///
    /// An empty POST message is reported as `POST_ERROR`, everything else as
    /// `INVALID_COMMAND`.
    pub fn for_parse_error(err: &ParseError) -> Self {
        if err.is_post_error() {
            Response::PostError(err.to_string())
        } else {
            Response::InvalidCommand(err.to_string())
        }
    }

    pub fn word(&self) -> ResponseWord {
        match self {
            Response::Board(_) => ResponseWord::GetBoard,
            Response::PostOk => ResponseWord::PostOk,
            Response::PostError(_) => ResponseWord::PostError,
            Response::InvalidCommand(_) => ResponseWord::InvalidCommand,
            Response::Goodbye => ResponseWord::Quit,
            Response::ShutdownNotice => ResponseWord::Server,
        }
    }

    /// Encode as complete wire text, terminator included.
    pub fn encode(&self, delims: &Delimiters) -> String {
        let mut out = String::from(self.word().as_str());
        match self {
            Response::Board(posts) => push_triples(&mut out, posts, delims),
            Response::PostOk => push_fields(&mut out, &["", "", ""], delims),
            Response::PostError(text) | Response::InvalidCommand(text) => {
                push_fields(&mut out, &["", "", text.as_str()], delims)
            }
            Response::Goodbye => push_fields(&mut out, &GOODBYE_FIELDS, delims),
            Response::ShutdownNotice => push_fields(&mut out, &SHUTDOWN_FIELDS, delims),
        }
        out.push_str(delims.terminator());
        out
    }

    /// Decode a response frame (client side).
    pub fn decode(raw: &str, delims: &Delimiters) -> Result<Self, ParseError> {
        let tokens = tokenize(raw, delims);
        let Some((word, fields)) = tokens.split_first() else {
            return Err(ParseError::Empty);
        };
        if word.is_empty() && fields.is_empty() {
            return Err(ParseError::Empty);
        }

        let Some(word) = ResponseWord::from_word(word) else {
            return Err(ParseError::UnknownCommand(word.to_string()));
        };

        match word {
            ResponseWord::GetBoard => triples(fields)
                .map(Response::Board)
                .ok_or(ParseError::MalformedResponse { word: GET_BOARD }),
            ResponseWord::PostOk => Ok(Response::PostOk),
            ResponseWord::PostError => error_text(fields, POST_ERROR).map(Response::PostError),
            ResponseWord::InvalidCommand => {
                error_text(fields, INVALID_COMMAND).map(Response::InvalidCommand)
            }
            ResponseWord::Quit => Ok(Response::Goodbye),
            ResponseWord::Server => Ok(Response::ShutdownNotice),
        }
    }
}

fn push_fields(out: &mut String, fields: &[&str], delims: &Delimiters) {
    for field in fields {
        out.push_str(delims.field());
        out.push_str(field);
    }
}

/// Error text lives in the message slot, the third field.
fn error_text(fields: &[&str], word: &'static str) -> Result<String, ParseError> {
    fields
        .get(2)
        .map(|text| text.to_string())
        .ok_or(ParseError::MalformedResponse { word })
}
