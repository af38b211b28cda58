/// Why a frame could not be turned into a command.
///
/// The display text is sent back to the client verbatim in the message slot
/// of the error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty message")]
    Empty,

    #[error("message is not valid UTF-8")]
    NotUtf8,

    #[error("invalid command: {0}")]
    UnknownCommand(String),

    /// POST with nothing after the command word.
    #[error("no posts")]
    NoPosts,

    /// POST whose field count is not a multiple of three.
    #[error("requires triples")]
    RequiresTriples,

    /// A POST triple with an empty message field.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// A server response that does not have the expected shape.
    #[error("malformed {word} response")]
    MalformedResponse { word: &'static str },
}

impl ParseError {
    /// Whether the frame was a well-formed POST whose content was refused.
    ///
    /// Only an empty message qualifies; a POST with missing or incomplete
    /// triples is a malformed command.
    pub fn is_post_error(&self) -> bool {
        matches!(self, ParseError::EmptyMessage)
    }
}

/// Invalid delimiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("{name} must not be empty")]
    EmptyDelimiter { name: &'static str },

    #[error("{shorter} {shorter_value:?} is a prefix of {longer} {longer_value:?}")]
    AmbiguousDelimiters {
        shorter: &'static str,
        shorter_value: String,
        longer: &'static str,
        longer_value: String,
    },
}
