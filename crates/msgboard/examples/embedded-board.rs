//! Run a board server and two clients in one process.
//!
//! Run with:
//!   cargo run --example embedded-board

use std::net::{Ipv4Addr, SocketAddr};
use std::thread;

use msgboard::protocol::PostPayload;
use msgboard::server::{BoardClient, BoardServer, ServerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::with_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)));
    let server = BoardServer::bind(config)?;
    let addr = server.local_addr();
    let shutdown = server.shutdown_handle();
    let dashboard = server.dashboard();
    eprintln!("Listening on {addr}");

    let server_thread = thread::spawn(move || server.run());

    let mut alice = BoardClient::connect(addr)?;
    alice.post(&[
        PostPayload::new("Alice", "Hello", "First post!"),
        PostPayload::new("Alice", "Hello", "Second post in the same batch"),
    ])?;

    let mut bob = BoardClient::connect(addr)?;
    bob.post(&[PostPayload::new("", "", "an anonymous note")])?;

    for post in bob.get_board("Alice", "")? {
        eprintln!("{}: {}", post.title, post.message);
    }
    alice.quit()?;

    let stats = dashboard.stats();
    eprintln!(
        "{} posts, {} connection(s) open",
        stats.posts, stats.active_connections
    );

    // Bob is still connected and gets the shutdown notice.
    shutdown.shutdown();
    server_thread
        .join()
        .map_err(|_| "server thread panicked")??;
    eprintln!("Bob received: {:?}", bob.recv()?);

    for event in dashboard.events() {
        eprintln!(
            "{} {:<10} {}",
            event.timestamp.format("%H:%M:%S%.3f"),
            event.kind,
            event.message
        );
    }
    Ok(())
}
