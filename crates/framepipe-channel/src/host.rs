use std::time::Duration;

use framepipe_frame::Message;
use framepipe_transport::{Pipe, PipeState};
use tracing::debug;

use crate::config::ChannelConfig;
use crate::endpoint::{Endpoint, Lifecycle};
use crate::error::Result;
use crate::handler::Handler;
use crate::sink::MessageSink;

/// The side of a channel that creates the pipe.
///
/// The host draws a random identifier, creates the pipe under it, and hands
/// the identifier to the client process out of band. One client is attached
/// at a time; when it leaves, the host waits for the next one.
///
/// ```no_run
/// use framepipe_channel::{ChannelConfig, Host};
///
/// let mut host = Host::new(ChannelConfig::default());
/// let id = host.initialize(|frame: &[u8]| println!("{} bytes", frame.len()))?;
/// println!("pass {id} to the client");
/// # Ok::<(), framepipe_channel::ChannelError>(())
/// ```
pub struct Host {
    config: ChannelConfig,
    lifecycle: Lifecycle,
    identifier: Option<u32>,
}

impl Host {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Idle,
            identifier: None,
        }
    }

    /// Create the pipe and start receiving into `handler`.
    ///
    /// Retries identifier collisions until a pipe is created (or
    /// `config.listen.max_attempts` is reached). Returns the identifier the
    /// client must connect to.
    pub fn initialize(&mut self, handler: impl Handler) -> Result<u32> {
        self.lifecycle.check_idle()?;
        self.config.validate()?;

        let pipe = Pipe::listen(&self.config.listen)?;
        let id = pipe.id();
        let endpoint = Endpoint::start(pipe, Box::new(handler), &self.config)?;
        self.lifecycle.activate(endpoint);
        self.identifier = Some(id);
        debug!(id, "host initialized");
        Ok(id)
    }

    /// Close the pipe and join the receiver thread.
    ///
    /// The host cannot be initialized again afterwards.
    pub fn deinitialize(&mut self) {
        self.lifecycle.finish();
        debug!(id = ?self.identifier, "host deinitialized");
    }

    /// The identifier chosen by [`Host::initialize`].
    pub fn identifier(&self) -> Option<u32> {
        self.identifier
    }

    /// Send raw bytes to the client. Best effort; failures are logged.
    pub fn send_message(&self, message: &[u8]) {
        self.lifecycle.send_message(message);
    }

    /// Encode and send a typed message.
    pub fn send(&self, message: &Message) {
        self.send_message(message.encode().as_bytes());
    }

    pub fn state(&self) -> PipeState {
        self.lifecycle.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == PipeState::Connected
    }

    /// Block until a client is attached. `false` on timeout or close.
    pub fn wait_connected(&self, timeout: Option<Duration>) -> bool {
        self.lifecycle.wait_connected(timeout)
    }
}

impl MessageSink for Host {
    fn send_message(&self, message: &[u8]) {
        Host::send_message(self, message);
    }
}
