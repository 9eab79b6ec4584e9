/// Errors that can occur while setting up or running a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] framepipe_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] framepipe_frame::FrameError),

    /// `initialize` was called on a channel that is already running.
    #[error("channel is already initialized")]
    AlreadyInitialized,

    /// `initialize` was called after `deinitialize`.
    #[error("channel was deinitialized and cannot be reused")]
    AlreadyUsed,

    /// The receive scratch buffer cannot hold one message.
    #[error("scratch capacity {capacity} is smaller than one {required}-byte message")]
    ScratchTooSmall { capacity: usize, required: usize },

    /// The receiver thread could not be started.
    #[error("failed to spawn receiver thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
