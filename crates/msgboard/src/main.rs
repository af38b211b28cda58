mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "msgboard", version, about = "TCP bulletin board server and client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_post_with_repeated_messages() {
        let cli = Cli::try_parse_from([
            "msgboard",
            "post",
            "127.0.0.1:26500",
            "--author",
            "Alice",
            "--message",
            "one",
            "-m",
            "two",
        ])
        .expect("post args should parse");

        match cli.command {
            Command::Post(args) => {
                assert_eq!(args.messages, vec!["one", "two"]);
                assert_eq!(args.title, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn post_requires_a_message() {
        let err = Cli::try_parse_from(["msgboard", "post", "localhost"])
            .expect_err("missing --message should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_serve_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "msgboard",
            "serve",
            "--bind",
            "127.0.0.1",
            "--port",
            "0",
            "--idle-timeout",
            "30s",
            "--log-level",
            "debug",
        ])
        .expect("serve args should parse");

        assert!(matches!(cli.log_level, LogLevel::Debug));
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.port, 0);
                assert_eq!(args.idle_timeout.as_deref(), Some("30s"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_board_filters() {
        let cli = Cli::try_parse_from(["msgboard", "board", "localhost", "--title", "T1"])
            .expect("board args should parse");
        assert!(matches!(cli.command, Command::Board(ref args) if args.title == "T1"));
    }
}
