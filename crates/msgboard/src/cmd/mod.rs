use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use clap::{Args, Subcommand};
use msgboard_server::ClientConfig;
use msgboard_transport::DEFAULT_PORT;

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod board;
pub mod post;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a board server until interrupted.
    Serve(ServeArgs),
    /// Add one or more posts in a single request.
    Post(PostArgs),
    /// Print the board, optionally filtered.
    Board(BoardArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Post(args) => post::run(args, format),
        Command::Board(args) => board::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "MSGBOARD_ADDR", default_value = "0.0.0.0")]
    pub bind: IpAddr,
    /// TCP port; 0 picks a free one.
    #[arg(long, env = "MSGBOARD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Drop clients that send nothing for this long (e.g. 30s, 500ms).
    #[arg(long)]
    pub idle_timeout: Option<String>,
    /// Largest request accepted, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_frame_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Server address (host or host:port).
    pub addr: String,
    /// Author for every post; empty posts anonymously.
    #[arg(long, default_value = "")]
    pub author: String,
    /// Title for every post.
    #[arg(long, default_value = "")]
    pub title: String,
    /// Message body; repeat to post several messages in one batch.
    #[arg(long = "message", short = 'm', required = true)]
    pub messages: Vec<String>,
    /// Request timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct BoardArgs {
    /// Server address (host or host:port).
    pub addr: String,
    /// Only posts by this exact author.
    #[arg(long, default_value = "")]
    pub author: String,
    /// Only posts with this exact title.
    #[arg(long, default_value = "")]
    pub title: String,
    /// Request timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Resolve `host[:port]`, defaulting to the standard board port.
pub(crate) fn resolve_addr(input: &str) -> CliResult<SocketAddr> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "address must not be empty"));
    }
    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    let with_port = if input.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()) {
        input.to_string()
    } else {
        format!("{input}:{DEFAULT_PORT}")
    };
    with_port
        .to_socket_addrs()
        .map_err(|err| io_error(&format!("cannot resolve {input}"), err))?
        .next()
        .ok_or_else(|| CliError::new(USAGE, format!("no address found for {input}")))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Client settings where every blocking step is bounded by `timeout`.
pub(crate) fn client_config(timeout: &str) -> CliResult<ClientConfig> {
    let timeout = parse_duration(timeout)?;
    let mut config = ClientConfig::default();
    config.frame.read_timeout = Some(timeout);
    config.frame.write_timeout = Some(timeout);
    config.connect_timeout = Some(timeout);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn resolve_addr_forms() {
        assert_eq!(
            resolve_addr("127.0.0.1:9000").unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(resolve_addr("127.0.0.1").unwrap().port(), DEFAULT_PORT);
        assert_eq!(resolve_addr("localhost").unwrap().port(), DEFAULT_PORT);
        assert_eq!(resolve_addr("localhost:7").unwrap().port(), 7);
        assert_eq!(resolve_addr("  ").unwrap_err().code, USAGE);
    }

    #[test]
    fn client_config_bounds_every_wait() {
        let config = client_config("250ms").unwrap();
        let expected = Some(Duration::from_millis(250));
        assert_eq!(config.frame.read_timeout, expected);
        assert_eq!(config.frame.write_timeout, expected);
        assert_eq!(config.connect_timeout, expected);
    }
}
