use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use framepipe_channel::{ChannelConfig, Client};
use framepipe_transport::ConnectConfig;

use crate::cmd::{install_ctrlc_handler, parse_duration, pump, ClientArgs, PumpEnd};
use crate::exit::{channel_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ClientArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let connect = ConnectConfig::default()
        .with_wait_for_server(!args.no_wait)
        .with_timeout(Some(timeout));
    let config = ChannelConfig::default().with_connect(connect);

    let (tx, frames) = mpsc::channel();
    let mut client = Client::new(config);
    client
        .initialize(
            move |frame: &[u8]| {
                let _ = tx.send(frame.to_vec());
            },
            args.id,
        )
        .map_err(|err| channel_error("connect failed", err))?;

    for message in &args.send {
        tracing::debug!(kind = message.name(), "sending");
        client.send(message);
    }

    let Some(count) = args.count else {
        client.deinitialize();
        return Ok(SUCCESS);
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (received, end) = pump(
        &frames,
        &running,
        Some(count),
        || client.state().is_valid(),
        |frame| print_message(frame, "host", format),
    );
    client.deinitialize();

    match end {
        PumpEnd::ChannelClosed => Err(CliError::new(
            FAILURE,
            format!("host disconnected after {received} of {count} messages"),
        )),
        _ => Ok(SUCCESS),
    }
}
