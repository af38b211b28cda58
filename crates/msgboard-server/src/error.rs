use msgboard_protocol::ResponseWord;

/// Errors that can occur in server and client operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] msgboard_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] msgboard_frame::FrameError),

    /// A response frame could not be decoded.
    #[error("undecodable response: {0}")]
    Decode(#[from] msgboard_protocol::ParseError),

    /// The server answered with a different response word than expected.
    #[error("expected {expected} response, got {got}")]
    UnexpectedResponse {
        expected: ResponseWord,
        got: ResponseWord,
    },

    /// The server refused the request with `POST_ERROR` or `INVALID_COMMAND`.
    #[error("{word}: {reason}")]
    Rejected { word: ResponseWord, reason: String },

    /// A request would contain the transmission terminator before its end,
    /// so the server would see it as more than one frame.
    #[error("request contains the transmission terminator")]
    EmbeddedTerminator,

    /// The server broadcast its shutdown notice instead of answering.
    #[error("server is shutting down")]
    ShuttingDown,
}

impl ServerError {
    /// Whether the error is the peer going away rather than a fault.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ServerError::Frame(err) => err.is_closed(),
            ServerError::ShuttingDown => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
