use std::fmt;

/// Which end of the pipe this is. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Creates the named pipe and accepts one client at a time.
    Server,
    /// Connects to an existing named pipe.
    Client,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeState {
    Uninitialized,
    Listening,
    /// Never reported by [`Pipe`](crate::Pipe): a client pipe only exists
    /// once `connect_client` has made its connection, and starts `Connected`.
    /// Kept so the state set stays complete for callers that track their own
    /// connect attempts.
    Connecting,
    Connected,
    Closing,
    Closed,
}

impl PipeState {
    /// Whether I/O may still be attempted.
    pub fn is_valid(self) -> bool {
        !matches!(
            self,
            PipeState::Uninitialized | PipeState::Closing | PipeState::Closed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipeState::Uninitialized => "uninitialized",
            PipeState::Listening => "listening",
            PipeState::Connecting => "connecting",
            PipeState::Connected => "connected",
            PipeState::Closing => "closing",
            PipeState::Closed => "closed",
        }
    }
}

impl fmt::Display for PipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one in-flight transfer.
///
/// A transfer is complete only when every requested byte moved; anything
/// less is a failure, never a partial success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOp {
    total: usize,
    transferred: usize,
}

impl PendingOp {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            transferred: 0,
        }
    }

    pub fn record(&mut self, bytes: usize) {
        self.transferred = self.transferred.saturating_add(bytes);
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn transferred(&self) -> usize {
        self.transferred
    }

    pub fn is_complete(&self) -> bool {
        self.transferred == self.total
    }
}
