use std::time::Duration;

use framepipe_frame::Message;
use framepipe_transport::{Pipe, PipeState};
use tracing::debug;

use crate::config::ChannelConfig;
use crate::endpoint::{Endpoint, Lifecycle};
use crate::error::Result;
use crate::handler::Handler;
use crate::sink::MessageSink;

/// The side of a channel that connects to a host's pipe.
///
/// A client has exactly one connection. When the host goes away the client
/// closes; it never reconnects.
pub struct Client {
    config: ChannelConfig,
    lifecycle: Lifecycle,
}

impl Client {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Idle,
        }
    }

    /// Connect to the host pipe named by `id` and start receiving into
    /// `handler`.
    ///
    /// On failure the client stays without a transport and can be
    /// initialized again; sends in the meantime are dropped.
    pub fn initialize(&mut self, handler: impl Handler, id: u32) -> Result<()> {
        self.lifecycle.check_idle()?;
        self.config.validate()?;

        let pipe = Pipe::connect_client(id, &self.config.connect)?;
        let endpoint = Endpoint::start(pipe, Box::new(handler), &self.config)?;
        self.lifecycle.activate(endpoint);
        debug!(id, "client initialized");
        Ok(())
    }

    /// Close the pipe and join the receiver thread.
    pub fn deinitialize(&mut self) {
        self.lifecycle.finish();
        debug!("client deinitialized");
    }

    /// Send raw bytes to the host. Best effort; failures are logged.
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

    pub fn wait_connected(&self, timeout: Option<Duration>) -> bool {
        self.lifecycle.wait_connected(timeout)
    }
}

impl MessageSink for Client {
    fn send_message(&self, message: &[u8]) {
        Client::send_message(self, message);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    use framepipe_transport::{random_identifier, ConnectConfig, TransportError};

    use super::*;
    use crate::error::ChannelError;
    use crate::host::Host;

    const WAIT: Duration = Duration::from_secs(5);

    fn no_wait() -> ChannelConfig {
        ChannelConfig::default().with_connect(ConnectConfig::default().with_wait_for_server(false))
    }

    #[test]
    fn connect_failure_leaves_client_without_transport() {
        let mut client = Client::new(no_wait());
        let err = client
            .initialize(|_: &[u8]| {}, random_identifier())
            .unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Transport(TransportError::Connect { .. })
        ));
        assert_eq!(client.state(), PipeState::Uninitialized);
        assert!(!client.is_connected());
        client.send(&Message::Quit);
        assert!(!client.wait_connected(Some(Duration::from_millis(10))));
    }

    #[test]
    fn initialize_can_be_retried_after_failure() {
        let mut host = Host::new(ChannelConfig::default());
        let id = host.initialize(|_: &[u8]| {}).unwrap();

        let mut client = Client::new(no_wait());
        assert!(client.initialize(|_: &[u8]| {}, id.wrapping_add(1)).is_err());
        client.initialize(|_: &[u8]| {}, id).unwrap();
        assert!(client.is_connected());

        client.deinitialize();
        host.deinitialize();
    }

    #[test]
    fn connect_times_out_after_host_leaves() {
        let mut host = Host::new(ChannelConfig::default());
        let id = host.initialize(|_: &[u8]| {}).unwrap();
        host.deinitialize();

        let config = ChannelConfig::default().with_connect(
            ConnectConfig::default().with_timeout(Some(Duration::from_millis(50))),
        );
        let mut client = Client::new(config);
        let err = client.initialize(|_: &[u8]| {}, id).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Transport(TransportError::Timeout(_))
        ));
    }

    #[test]
    fn client_closes_when_host_goes_away() {
        let mut host = Host::new(ChannelConfig::default());
        let id = host.initialize(|_: &[u8]| {}).unwrap();

        let mut client = Client::new(ChannelConfig::default());
        client.initialize(|_: &[u8]| {}, id).unwrap();
        assert!(host.wait_connected(Some(WAIT)));
        host.deinitialize();

        let deadline = Instant::now() + WAIT;
        while client.state().is_valid() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(client.state(), PipeState::Closed);
        client.send(&Message::Quit);
        client.deinitialize();
    }

    #[test]
    fn lifecycle_is_one_way() {
        let mut host = Host::new(ChannelConfig::default());
        let id = host.initialize(|_: &[u8]| {}).unwrap();

        let mut client = Client::new(ChannelConfig::default());
        client.initialize(|_: &[u8]| {}, id).unwrap();
        assert!(matches!(
            client.initialize(|_: &[u8]| {}, id),
            Err(ChannelError::AlreadyInitialized)
        ));
        client.deinitialize();
        assert!(matches!(
            client.initialize(|_: &[u8]| {}, id),
            Err(ChannelError::AlreadyUsed)
        ));
        assert_eq!(client.state(), PipeState::Closed);

        host.deinitialize();
    }

    #[test]
    fn host_echoes_client_frame() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let mut host = Host::new(ChannelConfig::default());
        let id = host
            .initialize(move |frame: &[u8]| {
                let _ = tx.send(frame.to_vec());
            })
            .unwrap();

        let (echo_tx, echoed) = mpsc::channel();
        let mut client = Client::new(ChannelConfig::default());
        client
            .initialize(
                move |frame: &[u8]| {
                    let _ = echo_tx.send(frame.to_vec());
                },
                id,
            )
            .unwrap();
        assert!(host.wait_connected(Some(WAIT)));

        client.send(&Message::BufferCommit);
        let frame = rx.recv_timeout(WAIT).unwrap();
        host.send_message(&frame);
        assert_eq!(echoed.recv_timeout(WAIT).unwrap(), frame);

        client.deinitialize();
        host.deinitialize();
    }
}
