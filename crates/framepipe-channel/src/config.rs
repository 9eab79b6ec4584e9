use std::time::Duration;

use framepipe_frame::MESSAGE_SIZE;
use framepipe_transport::{ConnectConfig, ListenConfig};

use crate::error::{ChannelError, Result};

/// Default receive scratch buffer size.
///
/// Larger than one message so oversized frames are read whole and dropped.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 4096;

/// Channel configuration shared by [`Host`](crate::Host) and
/// [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Receiver thread name. Defaults to `framepipe-recv-<role>`.
    pub thread_name: Option<String>,
    /// Receive scratch buffer size in bytes.
    pub scratch_capacity: usize,
    /// How long the host receiver waits for each client. `None` waits until
    /// the channel is closed.
    pub accept_timeout: Option<Duration>,
    /// Host listen loop settings.
    pub listen: ListenConfig,
    /// Client connection settings.
    pub connect: ConnectConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            thread_name: None,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            accept_timeout: None,
            listen: ListenConfig::default(),
            connect: ConnectConfig::default(),
        }
    }
}

impl ChannelConfig {
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub fn with_scratch_capacity(mut self, capacity: usize) -> Self {
        self.scratch_capacity = capacity;
        self
    }

    pub fn with_accept_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.accept_timeout = timeout;
        self
    }

    pub fn with_listen(mut self, listen: ListenConfig) -> Self {
        self.listen = listen;
        self
    }

    pub fn with_connect(mut self, connect: ConnectConfig) -> Self {
        self.connect = connect;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.scratch_capacity < MESSAGE_SIZE {
            return Err(ChannelError::ScratchTooSmall {
                capacity: self.scratch_capacity,
                required: MESSAGE_SIZE,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scratch_holds_oversized_frames() {
        let config = ChannelConfig::default();
        assert_eq!(config.scratch_capacity, 4096);
        assert!(config.validate().is_ok());
        assert!(config.thread_name.is_none());
    }

    #[test]
    fn scratch_smaller_than_message_is_rejected() {
        let err = ChannelConfig::default()
            .with_scratch_capacity(MESSAGE_SIZE - 1)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ChannelError::ScratchTooSmall {
                capacity: 31,
                required: 32
            }
        ));
        assert!(ChannelConfig::default()
            .with_scratch_capacity(MESSAGE_SIZE)
            .validate()
            .is_ok());
    }
}
