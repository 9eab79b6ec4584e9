use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use framepipe_channel::{ChannelConfig, Host};

use crate::cmd::{install_ctrlc_handler, parse_duration, pump, HostArgs, PumpEnd};
use crate::exit::{channel_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_identifier, print_message, OutputFormat};

pub fn run(args: HostArgs, format: OutputFormat) -> CliResult<i32> {
    let accept_timeout = args
        .accept_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;
    let config = ChannelConfig::default().with_accept_timeout(accept_timeout);

    let (tx, frames) = mpsc::channel();
    let mut host = Host::new(config);
    let id = host
        .initialize(move |frame: &[u8]| {
            let _ = tx.send(frame.to_vec());
        })
        .map_err(|err| channel_error("listen failed", err))?;
    print_identifier(id, format);

    if !args.send.is_empty() {
        if !host.wait_connected(accept_timeout) {
            host.deinitialize();
            return Err(CliError::new(TIMEOUT, "no client connected"));
        }
        for message in &args.send {
            tracing::debug!(kind = message.name(), "sending");
            host.send(message);
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (received, end) = pump(
        &frames,
        &running,
        args.count,
        || host.state().is_valid(),
        |frame| print_message(frame, "client", format),
    );
    host.deinitialize();

    match end {
        PumpEnd::ChannelClosed if received == 0 && accept_timeout.is_some() => {
            Err(CliError::new(TIMEOUT, "no client connected"))
        }
        _ => Ok(SUCCESS),
    }
}
