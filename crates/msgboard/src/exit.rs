use std::fmt;
use std::io;

use msgboard_frame::FrameError;
use msgboard_server::ServerError;
use msgboard_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrInUse => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::FrameTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn server_error(context: &str, err: ServerError) -> CliError {
    match err {
        ServerError::Transport(err) => transport_error(context, err),
        ServerError::Frame(err) => frame_error(context, err),
        ServerError::Decode(_) | ServerError::Rejected { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        ServerError::EmbeddedTerminator => CliError::new(USAGE, format!("{context}: {err}")),
        ServerError::UnexpectedResponse { .. } | ServerError::ShuttingDown => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use msgboard_protocol::{ParseError, ResponseWord};

    use super::*;

    #[test]
    fn refused_connection_is_transport_error() {
        let err = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(io_error("connect failed", err).code, TRANSPORT_ERROR);
    }

    #[test]
    fn timeouts_map_to_124() {
        let err = ServerError::Frame(FrameError::Io(io::Error::from(io::ErrorKind::WouldBlock)));
        assert_eq!(server_error("board failed", err).code, TIMEOUT);
    }

    #[test]
    fn rejected_requests_are_data_invalid() {
        let err = ServerError::Rejected {
            word: ResponseWord::PostError,
            reason: "message cannot be empty".into(),
        };
        let cli = server_error("post failed", err);
        assert_eq!(cli.code, DATA_INVALID);
        assert_eq!(
            cli.message,
            "post failed: POST_ERROR: message cannot be empty"
        );
        assert_eq!(
            server_error("x", ServerError::Decode(ParseError::NotUtf8)).code,
            DATA_INVALID
        );
    }

    #[test]
    fn protocol_surprises_are_failures() {
        let unexpected = ServerError::UnexpectedResponse {
            expected: ResponseWord::PostOk,
            got: ResponseWord::GetBoard,
        };
        assert_eq!(server_error("post failed", unexpected).code, FAILURE);
        assert_eq!(server_error("board failed", ServerError::ShuttingDown).code, FAILURE);
        assert_eq!(
            server_error("post failed", ServerError::EmbeddedTerminator).code,
            USAGE
        );
    }
}
