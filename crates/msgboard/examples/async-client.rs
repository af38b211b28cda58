//! Talk to a board server from tokio using the framing codec.
//!
//! Run with:
//!   cargo run --example async-client --features async
//!
//! A blocking server runs on a background thread; the client side is driven
//! by `tokio_util::codec::Framed` over a `tokio::net::TcpStream`.

use std::net::{Ipv4Addr, SocketAddr};
use std::thread;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use msgboard::frame::{TerminatorCodec, DEFAULT_TERMINATOR};
use msgboard::protocol::{Command, Delimiters, PostPayload, Response};
use msgboard::server::{BoardServer, ServerConfig};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::with_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)));
    let server = BoardServer::bind(config)?;
    let addr = server.local_addr();
    let shutdown = server.shutdown_handle();
    let server_thread = thread::spawn(move || server.run());

    let delims = Delimiters::default();
    let stream = TcpStream::connect(addr).await?;
    let mut framed = Framed::new(stream, TerminatorCodec::new(DEFAULT_TERMINATOR));

    let requests = [
        Command::Post {
            posts: vec![PostPayload::new("tokio", "async", "posted from a runtime")],
        },
        Command::GetBoard {
            author_filter: String::new(),
            title_filter: String::new(),
        },
        Command::Quit,
    ];

    for request in &requests {
        // Command::encode includes the terminator; the codec adds its own.
        let wire = request.encode(&delims);
        let body = wire.trim_end_matches(delims.terminator()).to_string();
        framed.send(Bytes::from(body)).await?;

        let Some(frame) = framed.next().await else {
            eprintln!("server closed the connection");
            break;
        };
        let frame = frame?;
        let response = Response::decode(std::str::from_utf8(&frame)?, &delims)?;
        eprintln!("{:?} -> {response:?}", request.word());
    }

    shutdown.shutdown();
    server_thread
        .join()
        .map_err(|_| "server thread panicked")??;
    Ok(())
}
