use std::io::{IsTerminal, Write};
use std::net::SocketAddr;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use msgboard_protocol::PostPayload;
use msgboard_store::BoardStats;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ListeningOutput {
    event: &'static str,
    addr: SocketAddr,
}

#[derive(Serialize)]
struct PostResultOutput<'a> {
    status: &'a str,
    posted: usize,
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    event: &'static str,
    #[serde(flatten)]
    stats: &'a BoardStats,
}

pub fn print_listening(addr: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ListeningOutput {
            event: "listening",
            addr,
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("listening on {addr}"),
        OutputFormat::Raw => println!("{addr}"),
    }
}

/// `wire` is the server's reply as it appeared on the wire.
pub fn print_post_result(posted: usize, wire: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&PostResultOutput {
            status: "POST_OK",
            posted,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["STATUS", "POSTED"])
                .add_row(vec!["POST_OK".to_string(), posted.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("POST_OK ({posted} post(s) added)"),
        OutputFormat::Raw => print_raw(wire.as_bytes()),
    }
}

pub fn print_posts(posts: &[PostPayload], wire: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&posts),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "AUTHOR", "TITLE", "MESSAGE"]);
            for (n, post) in posts.iter().enumerate() {
                table.add_row(vec![
                    (n + 1).to_string(),
                    display_author(&post.author).to_string(),
                    post.title.clone(),
                    post.message.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if posts.is_empty() {
                println!("(board is empty)");
            }
            for (n, post) in posts.iter().enumerate() {
                println!(
                    "[{}] {} | {}: {}",
                    n + 1,
                    display_author(&post.author),
                    post.title,
                    post.message
                );
            }
        }
        OutputFormat::Raw => print_raw(wire.as_bytes()),
    }
}

pub fn print_stats(stats: &BoardStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&StatsOutput {
            event: "stopped",
            stats,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["POSTS", "RECEIVED", "SENT", "OPEN CONNECTIONS"])
                .add_row(vec![
                    stats.posts.to_string(),
                    stats.total_messages_received.to_string(),
                    stats.total_messages_sent.to_string(),
                    stats.active_connections.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => println!(
            "stopped: posts={} received={} sent={} open_connections={}",
            stats.posts,
            stats.total_messages_received,
            stats.total_messages_sent,
            stats.active_connections
        ),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn display_author(author: &str) -> &str {
    if author.is_empty() {
        "(anonymous)"
    } else {
        author
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_author_shows_as_anonymous() {
        assert_eq!(display_author(""), "(anonymous)");
        assert_eq!(display_author("Alice"), "Alice");
    }
}
