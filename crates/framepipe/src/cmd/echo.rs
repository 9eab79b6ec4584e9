use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use framepipe_channel::{ChannelConfig, Host};
use framepipe_frame::{code_name, RawMessage};

use crate::cmd::{install_ctrlc_handler, pump, EchoArgs};
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::{print_identifier, OutputFormat};

pub fn run(args: EchoArgs, format: OutputFormat) -> CliResult<i32> {
    let (tx, frames) = mpsc::channel();
    let mut host = Host::new(ChannelConfig::default());
    let id = host
        .initialize(move |frame: &[u8]| {
            let _ = tx.send(frame.to_vec());
        })
        .map_err(|err| channel_error("listen failed", err))?;
    print_identifier(id, format);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    pump(
        &frames,
        &running,
        args.count,
        || host.state().is_valid(),
        |frame| {
            let code = RawMessage::from_bytes(frame).map(|raw| raw.code()).unwrap_or_default();
            tracing::info!(code, kind = code_name(code), "echoing message");
            host.send_message(frame);
        },
    );
    host.deinitialize();

    Ok(SUCCESS)
}
