use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use msgboard_frame::{FrameError, FrameReader, FrameWriter};
use msgboard_protocol::{parse_bytes, Command, Response};
use msgboard_store::{apply_post, log_preview, query_board, BoardStore, ClientId, EventKind};
use msgboard_transport::BoardStream;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::Result;

/// Write handles for every live connection, keyed by client id.
///
/// Used only by shutdown: to broadcast the notice and to tear sockets down so
/// that blocked readers wake up.
#[derive(Debug, Default)]
pub(crate) struct ConnectionRegistry {
    streams: Mutex<HashMap<ClientId, BoardStream>>,
}

impl ConnectionRegistry {
    fn insert(&self, client_id: ClientId, stream: BoardStream) {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client_id, stream);
    }

    fn remove(&self, client_id: ClientId) -> Option<BoardStream> {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&client_id)
    }

    /// Independent handles to every registered socket, in client id order.
    ///
    /// Handles are duplicated under the lock; callers do their I/O after it
    /// is released.
    pub(crate) fn snapshot(&self) -> Vec<(ClientId, BoardStream)> {
        let streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        let mut handles: Vec<_> = streams
            .iter()
            .filter_map(|(id, stream)| match stream.try_clone() {
                Ok(clone) => Some((*id, clone)),
                Err(err) => {
                    debug!(client_id = id, error = %err, "could not duplicate socket handle");
                    None
                }
            })
            .collect();
        drop(streams);
        handles.sort_unstable_by_key(|(id, _)| *id);
        handles
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// State shared by the listener and every connection thread.
#[derive(Debug)]
pub(crate) struct ServerContext {
    pub(crate) store: Arc<BoardStore>,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) config: ServerConfig,
    pub(crate) terminator: Bytes,
}

impl ServerContext {
    pub(crate) fn new(store: Arc<BoardStore>, config: ServerConfig) -> Self {
        let terminator = config.terminator();
        Self {
            store,
            registry: ConnectionRegistry::default(),
            config,
            terminator,
        }
    }
}

/// What the handler does after answering a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    AwaitFrame,
    Terminate,
}

/// One accepted client, driven by its own thread from accept to teardown.
pub(crate) struct Connection {
    client_id: ClientId,
    peer: Option<SocketAddr>,
    reader: FrameReader<BoardStream>,
    writer: FrameWriter<BoardStream>,
    ctx: Arc<ServerContext>,
}

impl Connection {
    /// Set up framing for `stream` and register it as live.
    pub(crate) fn open(
        stream: BoardStream,
        client_id: ClientId,
        ctx: Arc<ServerContext>,
    ) -> Result<Self> {
        let peer = stream.peer_addr().ok();
        if let Err(err) = stream.set_nodelay(true) {
            debug!(client_id, error = %err, "could not disable nagle");
        }

        let reader_stream = stream.try_clone()?;
        let registry_stream = stream.try_clone()?;
        let frame = ctx.config.frame.clone();
        let reader =
            FrameReader::with_config_stream(reader_stream, ctx.terminator.clone(), frame.clone())?;
        let writer = FrameWriter::with_config_stream(stream, ctx.terminator.clone(), frame)?;

        ctx.registry.insert(client_id, registry_stream);
        ctx.store.register_connection(client_id);
        info!(client_id, peer = ?peer, "client connected");
        ctx.store.log_event(
            EventKind::Connect,
            match peer {
                Some(addr) => format!("client {client_id} connected from {addr}"),
                None => format!("client {client_id} connected"),
            },
            None,
        );

        Ok(Self {
            client_id,
            peer,
            reader,
            writer,
            ctx,
        })
    }

    /// Serve requests strictly in order until the client quits, the stream
    /// fails, or the server tears the socket down.
    pub(crate) fn run(mut self) {
        loop {
            let frame = match self.reader.read_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    self.on_read_failure(&err);
                    break;
                }
            };

            match self.handle_frame(&frame) {
                Ok(Next::AwaitFrame) => {}
                Ok(Next::Terminate) => break,
                Err(err) => {
                    warn!(client_id = self.client_id, error = %err, "response write failed");
                    self.ctx.store.log_event(
                        EventKind::Disconnect,
                        format!("client {} dropped: {err}", self.client_id),
                        None,
                    );
                    break;
                }
            }
        }
        self.terminate();
    }

    fn handle_frame(&mut self, frame: &[u8]) -> Result<Next> {
        let raw = self.wire_text(frame);
        debug!(client_id = self.client_id, frame = %log_preview(&raw), "frame received");
        let store = Arc::clone(&self.ctx.store);
        let client_id = self.client_id;

        match parse_bytes(frame, &self.ctx.config.delimiters) {
            Command::Quit => {
                store.log_event(EventKind::Quit, format!("client {client_id} quit"), None);
                self.respond(&Response::Goodbye)?;
                Ok(Next::Terminate)
            }
            Command::Invalid(err) => {
                store.log_event(
                    EventKind::Error,
                    format!("client {client_id}: {err}"),
                    Some(raw),
                );
                self.respond(&Response::for_parse_error(&err))?;
                Ok(Next::AwaitFrame)
            }
            Command::GetBoard {
                author_filter,
                title_filter,
            } => {
                let wire = query_board(
                    &store,
                    &author_filter,
                    &title_filter,
                    &self.ctx.config.delimiters,
                );
                self.send_wire(wire.as_bytes())?;
                store.log_event(
                    EventKind::GetBoard,
                    format!("client {client_id} read the board"),
                    Some(raw),
                );
                Ok(Next::AwaitFrame)
            }
            Command::Post { posts } => {
                let count = posts.len();
                match apply_post(&store, posts, client_id) {
                    Ok(()) => {
                        self.respond(&Response::PostOk)?;
                        store.log_event(
                            EventKind::Post,
                            format!("client {client_id} added {count} post(s)"),
                            Some(raw),
                        );
                    }
                    Err(err) => {
                        self.respond(&Response::PostError(err.to_string()))?;
                        store.log_event(
                            EventKind::PostError,
                            format!("client {client_id}: {err}"),
                            Some(raw),
                        );
                    }
                }
                Ok(Next::AwaitFrame)
            }
        }
    }

    fn respond(&mut self, response: &Response) -> Result<()> {
        let wire = response.encode(&self.ctx.config.delimiters);
        self.send_wire(wire.as_bytes())
    }

    fn send_wire(&mut self, wire: &[u8]) -> Result<()> {
        self.writer.send_encoded(wire)?;
        self.ctx.store.record_sent();
        Ok(())
    }

    /// Frame body plus terminator, as it arrived.
    fn wire_text(&self, frame: &[u8]) -> String {
        let mut text = String::from_utf8_lossy(frame).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.ctx.terminator));
        text
    }

    fn on_read_failure(&self, err: &FrameError) {
        let client_id = self.client_id;
        if err.is_closed() {
            info!(client_id, peer = ?self.peer, "client disconnected");
            self.ctx.store.log_event(
                EventKind::Disconnect,
                format!("client {client_id} disconnected"),
                None,
            );
        } else {
            warn!(client_id, peer = ?self.peer, error = %err, "connection failed");
            self.ctx.store.log_event(
                EventKind::Disconnect,
                format!("client {client_id} dropped: {err}"),
                None,
            );
        }
    }

    fn terminate(self) {
        if let Err(err) = self.writer.get_ref().shutdown() {
            debug!(client_id = self.client_id, error = %err, "socket shutdown failed");
        }
        self.ctx.registry.remove(self.client_id);
        self.ctx.store.unregister_connection(self.client_id);
        debug!(client_id = self.client_id, "connection terminated");
    }
}
