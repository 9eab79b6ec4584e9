use std::fmt;
use std::io;

use framepipe_channel::ChannelError;
use framepipe_frame::FrameError;
use framepipe_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { .. }
        | TransportError::Connect { .. }
        | TransportError::NotConnected
        | TransportError::Disconnected
        | TransportError::Closed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Accept(source) | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    match err {
        ChannelError::Transport(err) => transport_error(context, err),
        ChannelError::Frame(err) => frame_error(context, err),
        ChannelError::ScratchTooSmall { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
