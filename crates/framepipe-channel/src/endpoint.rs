use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use framepipe_transport::{Pipe, PipeState};
use tracing::{debug, trace, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::handler::Handler;
use crate::receiver::ReceiverLoop;

/// A pipe plus the receiver thread draining it.
pub(crate) struct Endpoint {
    pipe: Arc<Pipe>,
    receiver: Option<JoinHandle<()>>,
}

impl Endpoint {
    /// Take ownership of `pipe` and start its receiver thread.
    ///
    /// If the thread cannot be started the pipe is closed.
    pub(crate) fn start(
        pipe: Pipe,
        handler: Box<dyn Handler>,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let pipe = Arc::new(pipe);
        let receiver = ReceiverLoop::spawn(Arc::clone(&pipe), handler, config)?;
        Ok(Self {
            pipe,
            receiver: Some(receiver),
        })
    }

    pub(crate) fn pipe(&self) -> &Pipe {
        &self.pipe
    }

    /// Close the pipe and join the receiver thread.
    ///
    /// Called from the receiver thread itself, this only closes; the thread
    /// finishes once the handler returns.
    pub(crate) fn close(&mut self) {
        self.pipe.close();
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        if receiver.thread().id() == thread::current().id() {
            debug!("endpoint closed from its receiver thread; not joining");
            return;
        }
        if receiver.join().is_err() {
            warn!("receiver thread panicked");
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.close();
    }
}

/// Lifecycle shared by [`Host`](crate::Host) and [`Client`](crate::Client).
///
/// A channel starts idle, becomes active once it has a transport, and ends
/// finished. It never goes back.
#[derive(Default)]
pub(crate) enum Lifecycle {
    #[default]
    Idle,
    Active(Endpoint),
    Finished,
}

impl Lifecycle {
    /// Fail unless the channel can still be initialized.
    pub(crate) fn check_idle(&self) -> Result<()> {
        match self {
            Lifecycle::Idle => Ok(()),
            Lifecycle::Active(_) => Err(ChannelError::AlreadyInitialized),
            Lifecycle::Finished => Err(ChannelError::AlreadyUsed),
        }
    }

    pub(crate) fn activate(&mut self, endpoint: Endpoint) {
        *self = Lifecycle::Active(endpoint);
    }

    /// Close any endpoint and mark the channel finished.
    pub(crate) fn finish(&mut self) {
        if let Lifecycle::Active(mut endpoint) = std::mem::replace(self, Lifecycle::Finished) {
            endpoint.close();
        }
    }

    pub(crate) fn pipe(&self) -> Option<&Pipe> {
        match self {
            Lifecycle::Active(endpoint) => Some(endpoint.pipe()),
            _ => None,
        }
    }

    pub(crate) fn state(&self) -> PipeState {
        match self {
            Lifecycle::Idle => PipeState::Uninitialized,
            Lifecycle::Active(endpoint) => endpoint.pipe().state(),
            Lifecycle::Finished => PipeState::Closed,
        }
    }

    /// Best-effort send. Failures are logged and dropped.
    pub(crate) fn send_message(&self, message: &[u8]) {
        let Some(pipe) = self.pipe() else {
            trace!(bytes = message.len(), "send without transport ignored");
            return;
        };
        if let Err(err) = pipe.send(message) {
            debug!(pipe = %pipe.name(), error = %err, "send failed");
        }
    }

    pub(crate) fn wait_connected(&self, timeout: Option<Duration>) -> bool {
        self.pipe().is_some_and(|pipe| pipe.wait_connected(timeout))
    }
}
