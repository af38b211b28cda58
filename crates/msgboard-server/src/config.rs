use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;
use msgboard_frame::FrameConfig;
use msgboard_protocol::Delimiters;
use msgboard_transport::DEFAULT_PORT;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening address. Default: `0.0.0.0:26500`.
    pub addr: SocketAddr,
    /// Per-connection framing limits and timeouts.
    pub frame: FrameConfig,
    /// Wire delimiters; the frame terminator is taken from here.
    pub delimiters: Delimiters,
    /// How often the accept loop checks the running flag. Default: 25ms.
    pub accept_poll_interval: Duration,
    /// Times the shutdown notice is sent to each client. Default: 3.
    pub shutdown_attempts: u32,
    /// Pause between notice rounds. Default: 50ms.
    pub shutdown_interval: Duration,
    /// Wait after the last round before sockets are torn down. Default: 200ms.
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    /// Default configuration listening on `addr`.
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }

    pub(crate) fn terminator(&self) -> Bytes {
        Bytes::copy_from_slice(self.delimiters.terminator().as_bytes())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            frame: FrameConfig::default(),
            delimiters: Delimiters::default(),
            accept_poll_interval: Duration::from_millis(25),
            shutdown_attempts: 3,
            shutdown_interval: Duration::from_millis(50),
            shutdown_grace: Duration::from_millis(200),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Framing limits; read/write timeouts bound each request.
    pub frame: FrameConfig,
    pub delimiters: Delimiters,
    /// Upper bound on establishing the TCP connection. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    pub(crate) fn terminator(&self) -> Bytes {
        Bytes::copy_from_slice(self.delimiters.terminator().as_bytes())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig {
                read_timeout: Some(Duration::from_secs(10)),
                write_timeout: Some(Duration::from_secs(10)),
                ..FrameConfig::default()
            },
            delimiters: Delimiters::default(),
            connect_timeout: Some(Duration::from_secs(5)),
        }
    }
}
