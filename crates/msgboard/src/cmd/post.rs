use msgboard_protocol::{Delimiters, PostPayload, Response};
use msgboard_server::BoardClient;

use crate::cmd::{client_config, resolve_addr, PostArgs};
use crate::exit::{server_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_post_result, OutputFormat};

pub fn run(args: PostArgs, format: OutputFormat) -> CliResult<i32> {
    let posts = build_posts(&args)?;
    let addr = resolve_addr(&args.addr)?;
    let config = client_config(&args.timeout)?;

    let mut client = BoardClient::connect_with_config(addr, &config)
        .map_err(|err| server_error("connect failed", err))?;
    client
        .post(&posts)
        .map_err(|err| server_error("post failed", err))?;
    if let Err(err) = client.quit() {
        tracing::debug!(error = %err, "quit after post failed");
    }

    let wire = Response::PostOk.encode(&Delimiters::default());
    print_post_result(posts.len(), &wire, format);
    Ok(SUCCESS)
}

/// One triple per `--message`, sharing author and title.
fn build_posts(args: &PostArgs) -> CliResult<Vec<PostPayload>> {
    if let Some(n) = args.messages.iter().position(String::is_empty) {
        return Err(CliError::new(
            USAGE,
            format!("message {} is empty; every post needs a message", n + 1),
        ));
    }
    Ok(args
        .messages
        .iter()
        .map(|message| PostPayload::new(&args.author, &args.title, message))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(messages: &[&str]) -> PostArgs {
        PostArgs {
            addr: "127.0.0.1".into(),
            author: "Alice".into(),
            title: "Notes".into(),
            messages: messages.iter().map(|m| m.to_string()).collect(),
            timeout: "5s".into(),
        }
    }

    #[test]
    fn one_triple_per_message() {
        let posts = build_posts(&args(&["first", "second"])).unwrap();
        assert_eq!(
            posts,
            vec![
                PostPayload::new("Alice", "Notes", "first"),
                PostPayload::new("Alice", "Notes", "second"),
            ]
        );
    }

    #[test]
    fn empty_message_is_usage_error() {
        let err = build_posts(&args(&["ok", ""])).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("message 2"));
    }
}
