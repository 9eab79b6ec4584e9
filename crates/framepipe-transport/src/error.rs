/// Errors that can occur in pipe transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to create the server side of a pipe (includes identifier collisions).
    #[error("failed to create pipe {name}: {source}")]
    Bind {
        name: String,
        source: std::io::Error,
    },

    /// Failed to connect to a pipe.
    #[error("failed to connect to pipe {name}: {source}")]
    Connect {
        name: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming client.
    #[error("failed to accept client: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the connected pipe.
    #[error("pipe I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pipe name does not fit the platform socket address.
    #[error("pipe address too long ({len} bytes, max {max}): {name}")]
    NameTooLong { name: String, len: usize, max: usize },

    /// A transfer finished with fewer bytes than requested.
    #[error("short transfer ({transferred} of {total} bytes)")]
    ShortTransfer { transferred: usize, total: usize },

    /// The operation requires a connected peer and there is none.
    #[error("pipe has no connected peer")]
    NotConnected,

    /// The peer closed its end of the pipe.
    #[error("peer disconnected")]
    Disconnected,

    /// The operation is only valid for the other pipe role.
    #[error("operation requires the {expected} role")]
    WrongRole { expected: &'static str },

    /// A blocking wait ran out of time.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The pipe has been closed (or was woken by a concurrent close).
    #[error("pipe closed")]
    Closed,
}

impl TransportError {
    /// True when the error is the normal outcome of a local `close()`.
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
