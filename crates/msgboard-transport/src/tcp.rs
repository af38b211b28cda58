use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::BoardStream;

/// Default TCP port for the board server.
pub const DEFAULT_PORT: u16 = 26500;

/// TCP listening transport.
///
/// Provides bind/accept/connect over IPv4 or IPv6 TCP. The listener is
/// released when the value is dropped.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `addr`.
    ///
    /// Port `0` picks an ephemeral port; see [`TcpTransport::local_addr`].
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|e| TransportError::Bind { addr, source: e })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::Bind { addr, source: e })?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Switch the listening socket between blocking and polling accept.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener
            .set_nonblocking(nonblocking)
            .map_err(Into::into)
    }

    /// Accept an incoming connection.
    ///
    /// In non-blocking mode an idle listener yields `TransportError::Accept`
    /// with `WouldBlock`; check [`TransportError::is_would_block`]. Accepted
    /// streams are always returned in blocking mode.
    pub fn accept(&self) -> Result<BoardStream> {
        let (stream, addr) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nonblocking(false)?;
        debug!(peer = %addr, "accepted connection");
        Ok(BoardStream::from_tcp(stream))
    }

    /// Connect to a listening board server (blocking).
    pub fn connect(addr: SocketAddr) -> Result<BoardStream> {
        let stream =
            TcpStream::connect(addr).map_err(|e| TransportError::Connect { addr, source: e })?;
        debug!(%addr, "connected");
        Ok(BoardStream::from_tcp(stream))
    }

    /// Connect with an upper bound on the TCP handshake time.
    pub fn connect_timeout(addr: SocketAddr, timeout: Duration) -> Result<BoardStream> {
        let stream = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|e| TransportError::Connect { addr, source: e })?;
        debug!(%addr, "connected");
        Ok(BoardStream::from_tcp(stream))
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::thread;

    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().expect("loopback address should parse")
    }

    #[test]
    fn bind_ephemeral_port_reports_real_address() {
        let transport = TcpTransport::bind(loopback()).expect("bind should succeed");
        assert_ne!(transport.local_addr().port(), 0);
    }

    #[test]
    fn bind_twice_on_same_port_fails() {
        let first = TcpTransport::bind(loopback()).expect("first bind should succeed");
        let err = TcpTransport::bind(first.local_addr()).unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }

    #[test]
    fn accept_and_exchange_bytes() {
        let transport = TcpTransport::bind(loopback()).expect("bind should succeed");
        let addr = transport.local_addr();

        let server = thread::spawn(move || {
            let mut stream = transport.accept().expect("accept should succeed");
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).expect("read should succeed");
            stream.write_all(&buf).expect("echo should succeed");
        });

        let mut client = TcpTransport::connect(addr).expect("connect should succeed");
        client.write_all(b"ping").expect("write should succeed");
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).expect("read should succeed");
        assert_eq!(&buf, b"ping");

        server.join().expect("server thread should finish");
    }

    #[test]
    fn nonblocking_accept_reports_would_block() {
        let transport = TcpTransport::bind(loopback()).expect("bind should succeed");
        transport
            .set_nonblocking(true)
            .expect("nonblocking should be settable");
        let err = transport.accept().unwrap_err();
        assert!(err.is_would_block());
    }

    #[test]
    fn shutdown_unblocks_cloned_reader() {
        let transport = TcpTransport::bind(loopback()).expect("bind should succeed");
        let addr = transport.local_addr();
        let _client = TcpTransport::connect(addr).expect("connect should succeed");
        let stream = transport.accept().expect("accept should succeed");
        let mut reader = stream.try_clone().expect("clone should succeed");

        let blocked = thread::spawn(move || {
            let mut buf = [0u8; 8];
            reader.read(&mut buf).expect("read should return after shutdown")
        });

        stream.shutdown().expect("shutdown should succeed");
        assert_eq!(blocked.join().expect("reader thread should finish"), 0);
    }

    #[test]
    fn connect_to_closed_port_fails() {
        let addr = {
            let transport = TcpTransport::bind(loopback()).expect("bind should succeed");
            transport.local_addr()
        };
        let err = TcpTransport::connect(addr).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
