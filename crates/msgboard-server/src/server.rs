use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use msgboard_frame::FrameWriter;
use msgboard_protocol::Response;
use msgboard_store::{BoardStore, ClientId, DashboardView, EventKind};
use msgboard_transport::{BoardStream, TcpTransport};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::connection::{Connection, ServerContext};
use crate::error::Result;

/// Board server: a polling accept loop plus one thread per connection.
pub struct BoardServer {
    transport: TcpTransport,
    ctx: Arc<ServerContext>,
}

impl BoardServer {
    /// Bind the configured address with a fresh, empty board.
    pub fn bind(config: ServerConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(BoardStore::new()))
    }

    /// Bind and serve an existing board, e.g. one filled by `restore`.
    pub fn with_store(config: ServerConfig, store: Arc<BoardStore>) -> Result<Self> {
        let transport = TcpTransport::bind(config.addr)?;
        Ok(Self {
            transport,
            ctx: Arc::new(ServerContext::new(store, config)),
        })
    }

    /// The address actually bound; differs from the config when port 0 was
    /// requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub fn store(&self) -> Arc<BoardStore> {
        Arc::clone(&self.ctx.store)
    }

    pub fn dashboard(&self) -> DashboardView {
        DashboardView::new(self.store())
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            store: self.store(),
        }
    }

    /// Accept connections until shutdown is requested, then notify every
    /// client and tear their sockets down.
    ///
    /// Blocks the calling thread. Connection threads are detached; the ones
    /// still running when this returns exit as soon as they observe EOF.
    pub fn run(self) -> Result<()> {
        let store = Arc::clone(&self.ctx.store);
        let addr = self.local_addr();
        let poll = self.ctx.config.accept_poll_interval;

        self.transport.set_nonblocking(true)?;
        info!(%addr, "board server running");
        store.log_event(EventKind::Server, format!("listening on {addr}"), None);

        while store.is_running() {
            match self.transport.accept() {
                Ok(stream) => self.spawn_connection(stream),
                Err(err) if err.is_would_block() => thread::sleep(poll),
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    store.log_event(EventKind::Warning, format!("accept failed: {err}"), None);
                    thread::sleep(poll);
                }
            }
        }

        self.broadcast_shutdown();
        drop(self.transport);
        info!(%addr, "board server stopped");
        store.log_event(EventKind::Server, "server stopped", None);
        Ok(())
    }

    fn spawn_connection(&self, stream: BoardStream) {
        let store = &self.ctx.store;
        let client_id = store.next_client_id();
        let ctx = Arc::clone(&self.ctx);

        let spawned = thread::Builder::new()
            .name(format!("msgboard-client-{client_id}"))
            .spawn(move || match Connection::open(stream, client_id, Arc::clone(&ctx)) {
                Ok(conn) => conn.run(),
                Err(err) => {
                    warn!(client_id, error = %err, "connection setup failed");
                    ctx.store.log_event(
                        EventKind::Warning,
                        format!("client {client_id} setup failed: {err}"),
                        None,
                    );
                }
            });

        if let Err(err) = spawned {
            warn!(client_id, error = %err, "could not spawn connection thread");
            store.log_event(
                EventKind::Warning,
                format!("client {client_id} rejected: {err}"),
                None,
            );
        }
    }

    /// Best effort: send the notice in several rounds, give handlers a grace
    /// period, then shut every remaining socket down.
    fn broadcast_shutdown(&self) {
        let cfg = &self.ctx.config;
        let store = &self.ctx.store;
        let notice = Response::ShutdownNotice.encode(&cfg.delimiters);

        let terminator = &self.ctx.terminator;
        let mut targets: Vec<(ClientId, FrameWriter<BoardStream>)> = self
            .ctx
            .registry
            .snapshot()
            .into_iter()
            .map(|(id, stream)| {
                let frame = cfg.frame.clone();
                (id, FrameWriter::with_config(stream, terminator.clone(), frame))
            })
            .collect();

        info!(clients = targets.len(), "broadcasting shutdown notice");
        store.log_event(
            EventKind::Server,
            format!("shutting down, notifying {} client(s)", targets.len()),
            None,
        );

        for round in 1..=cfg.shutdown_attempts {
            for (client_id, writer) in targets.iter_mut() {
                match writer.send_encoded(notice.as_bytes()) {
                    Ok(()) => store.record_sent(),
                    Err(err) => {
                        debug!(client_id = *client_id, round, error = %err, "notice not delivered")
                    }
                }
            }
            if round < cfg.shutdown_attempts {
                thread::sleep(cfg.shutdown_interval);
            }
        }
        drop(targets);

        thread::sleep(cfg.shutdown_grace);

        for (client_id, stream) in self.ctx.registry.snapshot() {
            if let Err(err) = stream.shutdown() {
                debug!(client_id, error = %err, "socket teardown failed");
            }
        }
    }
}

impl std::fmt::Debug for BoardServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardServer")
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

/// Cloneable handle that asks a running [`BoardServer`] to stop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    store: Arc<BoardStore>,
}

impl ShutdownHandle {
    /// Returns `true` for the call that actually flipped the running flag.
    pub fn shutdown(&self) -> bool {
        let flipped = self.store.request_shutdown();
        if flipped {
            info!("shutdown requested");
        }
        flipped
    }

    pub fn is_shutdown(&self) -> bool {
        !self.store.is_running()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::Ipv4Addr;
    use std::time::{Duration, Instant};

    use msgboard_frame::{FrameReader, DEFAULT_TERMINATOR};
    use msgboard_protocol::PostPayload;

    use super::*;

    struct Running {
        addr: SocketAddr,
        handle: ShutdownHandle,
        store: Arc<BoardStore>,
        thread: thread::JoinHandle<Result<()>>,
    }

    impl Running {
        fn stop(self) {
            self.handle.shutdown();
            self.thread
                .join()
                .expect("server thread should not panic")
                .expect("server should stop cleanly");
        }
    }

    fn start() -> Running {
        let server = BoardServer::bind(ServerConfig::with_addr(SocketAddr::from((
            Ipv4Addr::LOCALHOST,
            0,
        ))))
        .expect("server should bind");
        let addr = server.local_addr();
        let handle = server.shutdown_handle();
        let store = server.store();
        let thread = thread::spawn(move || server.run());
        Running {
            addr,
            handle,
            store,
            thread,
        }
    }

    struct Client {
        stream: BoardStream,
        replies: FrameReader<BoardStream>,
    }

    impl Client {
        fn connect(addr: SocketAddr) -> Self {
            let stream = TcpTransport::connect(addr).expect("connect should succeed");
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .expect("timeout should apply");
            let replies = FrameReader::new(stream.try_clone().unwrap(), DEFAULT_TERMINATOR);
            Self { stream, replies }
        }

        fn exchange(&mut self, wire: &str) -> String {
            self.stream.write_all(wire.as_bytes()).unwrap();
            self.reply()
        }

        fn reply(&mut self) -> String {
            let frame = self.replies.read_frame().expect("reply should arrive");
            format!("{}}}}}&{{{{", String::from_utf8(frame.to_vec()).unwrap())
        }
    }

    fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn post_then_read_back() {
        let server = start();
        let mut client = Client::connect(server.addr);

        assert_eq!(
            client.exchange("POST}+{Alice}+{Hello}+{Hi there}}&{{"),
            "POST_OK}+{}+{}+{}}&{{"
        );
        let posts = server.store.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0].to_payload(),
            PostPayload::new("Alice", "Hello", "Hi there")
        );
        assert_eq!(posts[0].client_id, 1);

        server.stop();
    }

    #[test]
    fn empty_board_reply() {
        let server = start();
        let mut client = Client::connect(server.addr);
        assert_eq!(client.exchange("GET_BOARD}}&{{"), "GET_BOARD}}&{{");
        server.stop();
    }

    #[test]
    fn batch_then_filtered_read() {
        let server = start();
        let mut client = Client::connect(server.addr);

        assert_eq!(
            client.exchange("POST}+{Alice}+{T1}+{M1}#{Bob}+{T2}+{M2}}&{{"),
            "POST_OK}+{}+{}+{}}&{{"
        );
        let authors: Vec<_> = server.store.posts().into_iter().map(|p| p.author).collect();
        assert_eq!(authors, vec!["Alice", "Bob"]);

        assert_eq!(
            client.exchange("GET_BOARD}+{Alice}+{}}&{{"),
            "GET_BOARD}+{Alice}+{T1}+{M1}}&{{"
        );
        assert_eq!(
            client.exchange("GET_BOARD}}&{{"),
            "GET_BOARD}+{Alice}+{T1}+{M1}#{Bob}+{T2}+{M2}}&{{"
        );

        server.stop();
    }

    #[test]
    fn empty_message_rejected_and_board_unchanged() {
        let server = start();
        let mut client = Client::connect(server.addr);

        assert_eq!(
            client.exchange("POST}+{Alice}+{Title}+{}}&{{"),
            "POST_ERROR}+{}+{}+{message cannot be empty}}&{{"
        );
        assert_eq!(server.store.post_count(), 0);
        assert_eq!(client.exchange("GET_BOARD}}&{{"), "GET_BOARD}}&{{");

        server.stop();
    }

    #[test]
    fn quit_gets_goodbye_then_close() {
        let server = start();
        let mut client = Client::connect(server.addr);

        assert_eq!(
            client.exchange("QUIT}}&{{"),
            "QUIT}+{SERVER}+{BYE!!!}+{Server says: BYE!!!}}&{{"
        );
        let mut rest = Vec::new();
        client
            .stream
            .read_to_end(&mut rest)
            .expect("server should close cleanly");
        assert!(rest.is_empty());
        wait_for("connection cleanup", || {
            server.store.active_connection_count() == 0
        });

        server.stop();
    }

    #[test]
    fn clients_share_one_board() {
        let server = start();
        let mut alice = Client::connect(server.addr);
        let mut bob = Client::connect(server.addr);

        alice.exchange("POST}+{Alice}+{A}+{from alice}}&{{");
        bob.exchange("POST}+{Bob}+{B}+{from bob}}&{{");
        assert_eq!(
            alice.exchange("GET_BOARD}+{Bob}+{}}&{{"),
            "GET_BOARD}+{Bob}+{B}+{from bob}}&{{"
        );

        let ids: Vec<_> = server.store.posts().iter().map(|p| p.client_id).collect();
        assert_eq!(ids, vec![1, 2]);

        // One client's garbage does not disturb the other.
        bob.exchange("NOPE}}&{{");
        assert_eq!(
            alice.exchange("GET_BOARD}+{}+{A}}&{{"),
            "GET_BOARD}+{Alice}+{A}+{from alice}}&{{"
        );

        server.stop();
    }

    #[test]
    fn shutdown_notifies_and_disconnects_clients() {
        let server = start();
        let mut client = Client::connect(server.addr);
        client.exchange("GET_BOARD}}&{{");
        wait_for("registration", || server.store.active_connection_count() == 1);

        let addr = server.addr;
        let store = Arc::clone(&server.store);
        server.stop();

        assert_eq!(
            client.reply(),
            "SERVER}+{SHUTDOWN}+{Server is shutting down}}&{{"
        );
        loop {
            match client.replies.read_frame() {
                Ok(frame) => assert_eq!(
                    frame.as_ref(),
                    b"SERVER}+{SHUTDOWN}+{Server is shutting down"
                ),
                Err(err) => {
                    assert!(err.is_closed(), "expected EOF, got {err}");
                    break;
                }
            }
        }

        wait_for("connection cleanup", || store.active_connection_count() == 0);
        assert!(!store.is_running());
        let kinds: Vec<_> = store.events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds.first(), Some(&EventKind::Server));
        assert!(kinds.contains(&EventKind::Disconnect));
        assert!(TcpTransport::connect(addr).is_err());
    }

    #[test]
    fn shutdown_handle_flips_once() {
        let server = start();
        let handle = server.handle.clone();
        assert!(!handle.is_shutdown());
        server.stop();
        assert!(handle.is_shutdown());
        assert!(!handle.shutdown());
    }
}
