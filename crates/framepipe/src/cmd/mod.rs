use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use framepipe_frame::{Message, Resize, SetSizeAndStyle};

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};

pub mod client;
pub mod codes;
pub mod echo;
pub mod host;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a pipe, print its identifier and print received messages.
    Host(HostArgs),
    /// Connect to a host by identifier and send messages.
    Client(ClientArgs),
    /// Create a pipe and send every received frame back.
    Echo(EchoArgs),
    /// List the known message codes.
    Codes(CodesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: crate::output::OutputFormat) -> CliResult<i32> {
    match command {
        Command::Host(args) => host::run(args, format),
        Command::Client(args) => client::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Codes(args) => codes::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Message to send once a client connects (repeatable).
    ///
    /// One of: quit, buffer-commit, frame-complete, resize:WxH,
    /// set-size:WxH[:STYLE].
    #[arg(long = "send", value_name = "MSG", value_parser = parse_message)]
    pub send: Vec<Message>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Give up if no client connects in time (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub accept_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Identifier printed by the host.
    pub id: u32,
    /// Message to send after connecting (repeatable).
    #[arg(long = "send", value_name = "MSG", value_parser = parse_message)]
    pub send: Vec<Message>,
    /// Wait for and print N messages from the host.
    #[arg(long)]
    pub count: Option<usize>,
    /// Fail immediately if the host pipe does not exist yet.
    #[arg(long)]
    pub no_wait: bool,
    /// Maximum time to wait for the host pipe (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Exit after echoing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct CodesArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse the `--send` message syntax.
pub fn parse_message(input: &str) -> Result<Message, String> {
    let input = input.trim();
    let (kind, rest) = match input.split_once(':') {
        Some((kind, rest)) => (kind, Some(rest)),
        None => (input, None),
    };

    match (kind, rest) {
        ("quit", None) => Ok(Message::Quit),
        ("buffer-commit", None) => Ok(Message::BufferCommit),
        ("frame-complete", None) => Ok(Message::FrameComplete),
        ("resize", Some(size)) => {
            let (width, height) = parse_size(size)?;
            Ok(Message::from(Resize { width, height }))
        }
        ("set-size", Some(args)) => {
            let (size, style) = match args.split_once(':') {
                Some((size, style)) => (size, parse_int(style)?),
                None => (args, 0),
            };
            let (width, height) = parse_size(size)?;
            Ok(Message::from(SetSizeAndStyle {
                width,
                height,
                style,
            }))
        }
        ("resize" | "set-size", None) => Err(format!("{kind} needs a size, e.g. {kind}:800x600")),
        _ => Err(format!("unknown message: {input}")),
    }
}

fn parse_size(input: &str) -> Result<(i32, i32), String> {
    let (width, height) = input
        .split_once('x')
        .ok_or_else(|| format!("invalid size (expected WxH): {input}"))?;
    Ok((parse_int(width)?, parse_int(height)?))
}

fn parse_int(input: &str) -> Result<i32, String> {
    input
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {input}"))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Why a [`pump`] stopped.
#[derive(Debug, PartialEq, Eq)]
pub enum PumpEnd {
    /// The requested number of frames arrived.
    CountReached,
    /// Ctrl-C.
    Interrupted,
    /// The channel closed before the count was reached.
    ChannelClosed,
}

/// Hand frames from the receiver thread to `on_frame` on this thread.
///
/// Stops after `count` frames (never, if `None`), on Ctrl-C, or once
/// `is_open` reports the channel gone and the queue is drained. Returns the
/// number of frames handled and why it stopped.
pub fn pump(
    frames: &Receiver<Vec<u8>>,
    running: &AtomicBool,
    count: Option<usize>,
    is_open: impl Fn() -> bool,
    mut on_frame: impl FnMut(&[u8]),
) -> (usize, PumpEnd) {
    let mut handled = 0usize;
    if count == Some(0) {
        return (handled, PumpEnd::CountReached);
    }
    while running.load(Ordering::SeqCst) {
        match frames.recv_timeout(Duration::from_millis(50)) {
            Ok(frame) => {
                on_frame(&frame);
                handled = handled.saturating_add(1);
                if count.is_some_and(|count| handled >= count) {
                    return (handled, PumpEnd::CountReached);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !is_open() {
                    return (handled, PumpEnd::ChannelClosed);
                }
            }
            Err(RecvTimeoutError::Disconnected) => return (handled, PumpEnd::ChannelClosed),
        }
    }
    (handled, PumpEnd::Interrupted)
}
