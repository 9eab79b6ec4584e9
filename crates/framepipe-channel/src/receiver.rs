use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use framepipe_frame::{code_name, RawMessage, MESSAGE_SIZE};
use framepipe_transport::{Pipe, Role};
use tracing::{debug, trace, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::handler::Handler;

/// Background loop that drains a pipe into a handler.
///
/// Runs on its own named thread until the pipe is closed. A server keeps
/// accepting new clients after each one leaves; a client stops after its
/// only connection ends.
pub(crate) struct ReceiverLoop {
    pipe: Arc<Pipe>,
    handler: Box<dyn Handler>,
    scratch: Vec<u8>,
    accept_timeout: Option<Duration>,
}

impl ReceiverLoop {
    pub(crate) fn spawn(
        pipe: Arc<Pipe>,
        handler: Box<dyn Handler>,
        config: &ChannelConfig,
    ) -> Result<JoinHandle<()>> {
        let name = config
            .thread_name
            .clone()
            .unwrap_or_else(|| default_thread_name(pipe.role()));
        let receiver = Self {
            pipe,
            handler,
            scratch: vec![0u8; config.scratch_capacity],
            accept_timeout: config.accept_timeout,
        };
        thread::Builder::new()
            .name(name)
            .spawn(move || receiver.run())
            .map_err(ChannelError::Spawn)
    }

    fn run(mut self) {
        debug!(pipe = %self.pipe.name(), role = %self.pipe.role(), "receiver started");
        match self.pipe.role() {
            Role::Server => self.run_server(),
            Role::Client => self.run_client(),
        }
        debug!(pipe = %self.pipe.name(), "receiver stopped");
    }

    fn run_server(&mut self) {
        while self.pipe.is_valid() {
            if let Err(err) = self.pipe.wait_for_client(self.accept_timeout) {
                debug!(error = %err, "no client; receiver exiting");
                return;
            }
            self.drain();
            if self.pipe.is_valid() {
                self.pipe.disconnect_peer();
            }
        }
    }

    fn run_client(&mut self) {
        self.drain();
        self.pipe.close();
    }

    /// Dispatch frames until the current connection ends.
    fn drain(&mut self) {
        loop {
            match self.pipe.receive(&mut self.scratch) {
                Ok(len) => self.dispatch(len),
                Err(err) if err.is_closed() => {
                    trace!("receive interrupted by close");
                    return;
                }
                Err(err) => {
                    debug!(error = %err, "receive ended");
                    return;
                }
            }
        }
    }

    fn dispatch(&self, len: usize) {
        if len != MESSAGE_SIZE {
            trace!(len, expected = MESSAGE_SIZE, "dropping frame of unexpected size");
            return;
        }
        let frame = &self.scratch[..MESSAGE_SIZE];
        if let Ok(raw) = RawMessage::from_bytes(frame) {
            trace!(code = raw.code(), kind = code_name(raw.code()), "dispatching frame");
        }

        let handler = &self.handler;
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| handler.handle_message(frame)))
        {
            warn!(panic = panic_message(&*panic), "message handler panicked");
        }
    }
}

fn default_thread_name(role: Role) -> String {
    format!("framepipe-recv-{role}")
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_names_follow_role() {
        assert_eq!(default_thread_name(Role::Server), "framepipe-recv-server");
        assert_eq!(default_thread_name(Role::Client), "framepipe-recv-client");
    }

    #[test]
    fn panic_messages_are_extracted() {
        let panic = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(&*panic), "boom");

        let panic = panic::catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(panic_message(&*panic), "formatted 1");

        let panic = panic::catch_unwind(|| std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(panic_message(&*panic), "non-string panic payload");
    }
}
