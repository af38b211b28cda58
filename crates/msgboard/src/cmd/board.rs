use msgboard_protocol::{Delimiters, Response};
use msgboard_server::BoardClient;

use crate::cmd::{client_config, resolve_addr, BoardArgs};
use crate::exit::{server_error, CliResult, SUCCESS};
use crate::output::{print_posts, OutputFormat};

pub fn run(args: BoardArgs, format: OutputFormat) -> CliResult<i32> {
    let addr = resolve_addr(&args.addr)?;
    let config = client_config(&args.timeout)?;

    let mut client = BoardClient::connect_with_config(addr, &config)
        .map_err(|err| server_error("connect failed", err))?;
    let posts = client
        .get_board(&args.author, &args.title)
        .map_err(|err| server_error("board request failed", err))?;
    if let Err(err) = client.quit() {
        tracing::debug!(error = %err, "quit after board request failed");
    }

    let wire = Response::Board(posts.clone()).encode(&Delimiters::default());
    print_posts(&posts, &wire, format);
    Ok(SUCCESS)
}
