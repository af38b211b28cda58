use std::net::SocketAddr;

use msgboard_frame::{FrameReader, FrameWriter};
use msgboard_protocol::{Command, Delimiters, ParseError, PostPayload, Response, ResponseWord};
use msgboard_transport::{BoardStream, TcpTransport};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Result, ServerError};

/// Blocking client for a board server: one request, one response.
pub struct BoardClient {
    reader: FrameReader<BoardStream>,
    writer: FrameWriter<BoardStream>,
    delims: Delimiters,
}

impl BoardClient {
    /// Connect with default configuration.
    pub fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, &ClientConfig::default())
    }

    /// Connect with explicit configuration.
    pub fn connect_with_config(addr: SocketAddr, config: &ClientConfig) -> Result<Self> {
        let stream = match config.connect_timeout {
            Some(timeout) => TcpTransport::connect_timeout(addr, timeout)?,
            None => TcpTransport::connect(addr)?,
        };
        stream.set_nodelay(true)?;
        let reader_stream = stream.try_clone()?;

        let terminator = config.terminator();
        let frame = config.frame.clone();
        let reader =
            FrameReader::with_config_stream(reader_stream, terminator.clone(), frame.clone())?;
        let writer = FrameWriter::with_config_stream(stream, terminator, frame)?;

        Ok(Self {
            reader,
            writer,
            delims: config.delimiters.clone(),
        })
    }

    /// Fetch posts matching both filters. Empty filters match everything.
    pub fn get_board(&mut self, author: &str, title: &str) -> Result<Vec<PostPayload>> {
        let command = Command::GetBoard {
            author_filter: author.to_string(),
            title_filter: title.to_string(),
        };
        match self.send_command(&command)? {
            Response::Board(posts) => Ok(posts),
            other => Err(refusal(ResponseWord::GetBoard, other)),
        }
    }

    /// Submit a batch of posts in one `POST`.
    pub fn post(&mut self, posts: &[PostPayload]) -> Result<()> {
        let command = Command::Post {
            posts: posts.to_vec(),
        };
        match self.send_command(&command)? {
            Response::PostOk => Ok(()),
            other => Err(refusal(ResponseWord::PostOk, other)),
        }
    }

    /// Send `body` as one frame and return whatever the server answers.
    ///
    /// The terminator is appended. A `body` that already contains one is
    /// refused with [`ServerError::EmbeddedTerminator`] before anything is
    /// written.
    pub fn request(&mut self, body: &str) -> Result<Response> {
        if body.contains(self.delims.terminator()) {
            return Err(ServerError::EmbeddedTerminator);
        }
        self.writer.send(body.as_bytes())?;
        self.recv()
    }

    /// Read the next response, including unsolicited shutdown notices.
    pub fn recv(&mut self) -> Result<Response> {
        let frame = self.reader.read_frame()?;
        let text = std::str::from_utf8(&frame).map_err(|_| ParseError::NotUtf8)?;
        let response = Response::decode(text, &self.delims)?;
        debug!(word = %response.word(), "response received");
        Ok(response)
    }

    /// Say goodbye and close the connection.
    pub fn quit(mut self) -> Result<()> {
        let response = self.send_command(&Command::Quit)?;
        if let Err(err) = self.writer.get_ref().shutdown() {
            debug!(error = %err, "socket shutdown after quit failed");
        }
        match response {
            Response::Goodbye => Ok(()),
            other => Err(refusal(ResponseWord::Quit, other)),
        }
    }

    fn send_command(&mut self, command: &Command) -> Result<Response> {
        let wire = command.encode(&self.delims);
        let terminator = self.delims.terminator();
        let body = wire.strip_suffix(terminator).unwrap_or(wire.as_str());
        if body.contains(terminator) {
            return Err(ServerError::EmbeddedTerminator);
        }
        self.writer.send_encoded(wire.as_bytes())?;
        self.recv()
    }
}

impl std::fmt::Debug for BoardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardClient")
            .field("stream", self.writer.get_ref())
            .finish()
    }
}

fn refusal(expected: ResponseWord, got: Response) -> ServerError {
    match got {
        Response::PostError(reason) => ServerError::Rejected {
            word: ResponseWord::PostError,
            reason,
        },
        Response::InvalidCommand(reason) => ServerError::Rejected {
            word: ResponseWord::InvalidCommand,
            reason,
        },
        Response::ShutdownNotice => ServerError::ShuttingDown,
        other => ServerError::UnexpectedResponse {
            expected,
            got: other.word(),
        },
    }
}
