use std::net::SocketAddr;

use msgboard_frame::FrameConfig;
use msgboard_server::{BoardServer, ServerConfig, ShutdownHandle};

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{server_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_listening, print_stats, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = server_config(&args)?;
    let server = BoardServer::bind(config).map_err(|err| server_error("bind failed", err))?;

    install_ctrlc_handler(server.shutdown_handle())?;
    let dashboard = server.dashboard();
    print_listening(server.local_addr(), format);

    server.run().map_err(|err| server_error("server failed", err))?;

    print_stats(&dashboard.stats(), format);
    Ok(SUCCESS)
}

fn server_config(args: &ServeArgs) -> CliResult<ServerConfig> {
    let read_timeout = args
        .idle_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;

    let mut frame = FrameConfig {
        read_timeout,
        ..FrameConfig::default()
    };
    if let Some(max) = args.max_frame_size {
        if max == 0 {
            return Err(CliError::new(USAGE, "--max-frame-size must be greater than zero"));
        }
        frame.max_frame_size = max;
    }

    Ok(ServerConfig {
        addr: SocketAddr::new(args.bind, args.port),
        frame,
        ..ServerConfig::default()
    })
}

fn install_ctrlc_handler(handle: ShutdownHandle) -> CliResult<()> {
    ctrlc::set_handler(move || {
        handle.shutdown();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
