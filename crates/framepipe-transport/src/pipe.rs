use std::fmt;
use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::{ConnectConfig, ListenConfig};
use crate::error::{Result, TransportError};
use crate::name::{random_identifier, PipeName};
use crate::state::{PendingOp, PipeState, Role};
use crate::sys::{self, Interest, Readiness};
use crate::wake::WakeSignal;

/// A named, duplex, message-framed pipe between exactly two processes.
///
/// Backed by an `AF_UNIX` / `SOCK_SEQPACKET` socket: each `send` arrives as
/// exactly one `receive`, in order. All blocking operations (`send`,
/// `receive`, `wait_for_client`) can be interrupted from another thread with
/// [`Pipe::close`].
///
/// The server owns a listening socket only while it has no client. Once a
/// client is accepted the name is released, so further clients are refused
/// (or keep waiting) until [`Pipe::disconnect_peer`] listens again.
///
/// `Pipe` is `Sync`; a sender thread and the receiver thread share it through
/// an `Arc`. Sends and receives use separate wake signals and never wait on
/// each other.
pub struct Pipe {
    name: PipeName,
    role: Role,
    shared: Mutex<Shared>,
    state_changed: Condvar,
    read_wake: WakeSignal,
    write_wake: WakeSignal,
}

struct Shared {
    state: PipeState,
    // Both sockets are reference counted so `close` can release them while a
    // blocked operation still holds a clone; the descriptor is released by
    // the last owner.
    listener: Option<Arc<OwnedFd>>,
    connection: Option<Arc<OwnedFd>>,
    #[cfg(not(target_os = "linux"))]
    socket_file: Option<SocketFile>,
}

impl Pipe {
    /// Create the server side of the pipe named after `id`.
    ///
    /// Fails with [`TransportError::Bind`] if a pipe with that name already
    /// exists.
    pub fn create_server(id: u32) -> Result<Self> {
        let name = PipeName::new(id);
        check_name_len(&name)?;

        let bind_error = |source: io::Error| TransportError::Bind {
            name: name.to_string(),
            source,
        };
        let listener = bind_listener(&name).map_err(bind_error)?;

        let pipe = Self::from_parts(
            name,
            Role::Server,
            Some(Arc::new(listener)),
            None,
            PipeState::Listening,
        )?;
        debug!(pipe = %pipe.name, "created pipe server");
        Ok(pipe)
    }

    /// Create a server under a freshly drawn random identifier.
    ///
    /// Identifier collisions and creation failures are retried with a new
    /// identifier. Without `max_attempts` this only returns on success.
    pub fn listen(config: &ListenConfig) -> Result<Self> {
        Self::listen_from(config, random_identifier)
    }

    fn listen_from(config: &ListenConfig, mut next_id: impl FnMut() -> u32) -> Result<Self> {
        let mut attempts: u32 = 0;
        loop {
            let id = next_id();
            attempts = attempts.saturating_add(1);
            match Self::create_server(id) {
                Ok(pipe) => return Ok(pipe),
                Err(err) => {
                    debug!(
                        id,
                        attempts,
                        error = %err,
                        "pipe creation failed; drawing a new identifier"
                    );
                    if let Some(max) = config.max_attempts {
                        if attempts >= max.get() {
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    /// Connect to the server side of the pipe named after `id`.
    pub fn connect_client(id: u32, config: &ConnectConfig) -> Result<Self> {
        let name = PipeName::new(id);
        check_name_len(&name)?;

        let connect_error = |source: io::Error| TransportError::Connect {
            name: name.to_string(),
            source,
        };
        let started = Instant::now();
        let connection = loop {
            let fd = sys::seqpacket_socket().map_err(connect_error)?;
            match sys::connect(&fd, &name) {
                Ok(()) => break fd,
                Err(err) if config.wait_for_server && is_server_absent(&err) => {
                    if let Some(timeout) = config.timeout {
                        if started.elapsed() >= timeout {
                            return Err(TransportError::Timeout(timeout));
                        }
                    }
                    trace!(pipe = %name, "pipe not available yet; retrying");
                    std::thread::sleep(config.retry_interval);
                }
                Err(err) => return Err(connect_error(err)),
            }
        };
        // Seqpacket sockets already deliver whole messages; only the
        // blocking mode needs switching.
        sys::set_nonblocking(&connection).map_err(connect_error)?;

        let pipe = Self::from_parts(
            name,
            Role::Client,
            None,
            Some(Arc::new(connection)),
            PipeState::Connected,
        )?;
        debug!(pipe = %pipe.name, "connected to pipe");
        Ok(pipe)
    }

    fn from_parts(
        name: PipeName,
        role: Role,
        listener: Option<Arc<OwnedFd>>,
        connection: Option<Arc<OwnedFd>>,
        state: PipeState,
    ) -> Result<Self> {
        #[cfg(not(target_os = "linux"))]
        let socket_file = match role {
            Role::Server => SocketFile::capture(&name),
            Role::Client => None,
        };
        Ok(Self {
            name,
            role,
            shared: Mutex::new(Shared {
                state,
                listener,
                connection,
                #[cfg(not(target_os = "linux"))]
                socket_file,
            }),
            state_changed: Condvar::new(),
            read_wake: WakeSignal::new()?,
            write_wake: WakeSignal::new()?,
        })
    }

    /// Wait for a client to connect (server only).
    ///
    /// Returns immediately if a client is already connected. A timeout, a
    /// concurrent `close`, or any accept failure closes the pipe.
    pub fn wait_for_client(&self, timeout: Option<Duration>) -> Result<()> {
        if self.role != Role::Server {
            return Err(TransportError::WrongRole { expected: "server" });
        }

        let listener = {
            let shared = self.shared();
            if !shared.state.is_valid() {
                return Err(TransportError::Closed);
            }
            if shared.connection.is_some() {
                return Ok(());
            }
            shared.listener.clone().ok_or(TransportError::Closed)?
        };

        let result = self.accept_client(&listener, timeout);
        // Release this clone first so `close` frees the name.
        drop(listener);
        if let Err(err) = &result {
            debug!(pipe = %self.name, error = %err, "waiting for client failed");
            self.close();
        }
        result
    }

    fn accept_client(&self, listener: &OwnedFd, timeout: Option<Duration>) -> Result<()> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            let remaining =
                deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()));
            let ready = sys::wait(
                listener.as_fd(),
                Interest::Read,
                self.read_wake.as_fd(),
                remaining,
            )
            .map_err(TransportError::Accept)?;
            match ready {
                Readiness::Woken => return Err(TransportError::Closed),
                Readiness::TimedOut => {
                    return Err(TransportError::Timeout(timeout.unwrap_or_default()))
                }
                Readiness::Ready => {}
            }

            match sys::accept(listener) {
                Ok(fd) => {
                    let mut shared = self.shared();
                    if !shared.state.is_valid() {
                        return Err(TransportError::Closed);
                    }
                    shared.connection = Some(Arc::new(fd));
                    shared.state = PipeState::Connected;
                    // Stop listening so a second client cannot queue up
                    // behind the first one.
                    let released = shared.listener.take();
                    drop(shared);
                    drop(released);
                    self.state_changed.notify_all();
                    debug!(pipe = %self.name, "client connected; refusing others");
                    return Ok(());
                }
                Err(err) if is_transient(&err) => continue,
                Err(err) if err.raw_os_error() == Some(libc::ECONNABORTED) => continue,
                Err(err) => return Err(TransportError::Accept(err)),
            }
        }
    }

    /// Send one frame, blocking until it is fully transferred.
    ///
    /// Empty buffers and sends on a closed pipe are silent no-ops.
    pub fn send(&self, buf: &[u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let connection = {
            let shared = self.shared();
            if !shared.state.is_valid() {
                trace!(pipe = %self.name, "send on closed pipe ignored");
                return Ok(());
            }
            shared
                .connection
                .clone()
                .ok_or(TransportError::NotConnected)?
        };

        let mut op = PendingOp::new(buf.len());
        loop {
            match sys::wait(
                connection.as_fd(),
                Interest::Write,
                self.write_wake.as_fd(),
                None,
            )? {
                Readiness::Woken => return Err(TransportError::Closed),
                Readiness::TimedOut => continue,
                Readiness::Ready => {}
            }
            match sys::send(connection.as_fd(), buf) {
                Ok(sent) => {
                    op.record(sent);
                    break;
                }
                Err(err) if is_transient(&err) => continue,
                Err(_) if !self.is_valid() => return Err(TransportError::Closed),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        trace!(pipe = %self.name, bytes = op.transferred(), "sent frame");
        if op.is_complete() {
            Ok(())
        } else {
            Err(TransportError::ShortTransfer {
                transferred: op.transferred(),
                total: op.total(),
            })
        }
    }

    /// Receive one frame into `buf`, blocking until it arrives.
    ///
    /// Returns the observed frame length. A frame that did not fit reports a
    /// length greater than `buf.len()` (the excess is discarded); on Linux it
    /// is the exact length.
    pub fn receive(&self, buf: &mut [u8]) -> Result<usize> {
        let connection = {
            let shared = self.shared();
            if !shared.state.is_valid() {
                return Err(TransportError::Closed);
            }
            shared
                .connection
                .clone()
                .ok_or(TransportError::NotConnected)?
        };

        let mut op = PendingOp::new(buf.len());
        loop {
            match sys::wait(
                connection.as_fd(),
                Interest::Read,
                self.read_wake.as_fd(),
                None,
            )? {
                Readiness::Woken => return Err(TransportError::Closed),
                Readiness::TimedOut => continue,
                Readiness::Ready => {}
            }
            match sys::recv(connection.as_fd(), buf) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(received) => {
                    op.record(received);
                    trace!(pipe = %self.name, bytes = received, "received frame");
                    return Ok(op.transferred());
                }
                Err(err) if is_transient(&err) => continue,
                Err(err) if err.raw_os_error() == Some(libc::ECONNRESET) => {
                    return Err(TransportError::Disconnected)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Drop the current peer.
    ///
    /// A server binds its name again and goes back to listening for the next
    /// client; if that fails the pipe closes. A client has no way to
    /// reconnect and closes.
    pub fn disconnect_peer(&self) {
        if self.role == Role::Client {
            self.close();
            return;
        }

        let connection = self.shared().connection.take();
        if let Some(connection) = connection {
            if let Err(err) = sys::shutdown(connection.as_fd()) {
                trace!(error = %err, "shutdown of dropped client failed");
            }
            debug!(pipe = %self.name, "client disconnected");
        }

        if let Err(err) = self.listen_again() {
            debug!(pipe = %self.name, error = %err, "could not listen again; closing pipe");
            self.close();
            return;
        }
        self.state_changed.notify_all();
    }

    fn listen_again(&self) -> io::Result<()> {
        let mut shared = self.shared();
        if !shared.state.is_valid() {
            return Ok(());
        }
        if shared.listener.is_none() {
            #[cfg(not(target_os = "linux"))]
            if let Some(socket_file) = shared.socket_file.take() {
                socket_file.remove();
            }
            shared.listener = Some(Arc::new(bind_listener(&self.name)?));
            #[cfg(not(target_os = "linux"))]
            {
                shared.socket_file = SocketFile::capture(&self.name);
            }
            debug!(pipe = %self.name, "listening again");
        }
        shared.state = PipeState::Listening;
        Ok(())
    }

    /// Close the pipe, release its name and wake every blocked operation.
    ///
    /// Idempotent and safe to call from any thread. Once this returns, new
    /// clients can no longer connect to the name.
    pub fn close(&self) {
        let (connection, listener) = {
            let mut shared = self.shared();
            if matches!(shared.state, PipeState::Closing | PipeState::Closed) {
                return;
            }
            shared.state = PipeState::Closing;
            (shared.connection.take(), shared.listener.take())
        };
        debug!(pipe = %self.name, role = %self.role, "closing pipe");

        if let Some(connection) = connection {
            if let Err(err) = sys::shutdown(connection.as_fd()) {
                trace!(error = %err, "shutdown during close failed");
            }
        }
        // Shutting the socket down is not enough to wake a thread parked in
        // poll on the listener; signal the waits explicitly.
        self.read_wake.signal();
        self.write_wake.signal();

        // A thread still accepting holds its own clone and drops it as soon
        // as the wake reaches it.
        drop(listener);
        #[cfg(not(target_os = "linux"))]
        if let Some(socket_file) = self.shared().socket_file.take() {
            socket_file.remove();
        }

        self.shared().state = PipeState::Closed;
        self.state_changed.notify_all();
    }

    /// Block until a peer is connected. Returns `false` on timeout or close.
    pub fn wait_connected(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut shared = self.shared();
        loop {
            if shared.state == PipeState::Connected {
                return true;
            }
            if !shared.state.is_valid() {
                return false;
            }
            shared = match deadline {
                None => self
                    .state_changed
                    .wait(shared)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    match self.state_changed.wait_timeout(shared, remaining) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    }
                }
            };
        }
    }

    pub fn id(&self) -> u32 {
        self.name.id()
    }

    pub fn name(&self) -> &PipeName {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> PipeState {
        self.shared().state
    }

    pub fn is_valid(&self) -> bool {
        self.state().is_valid()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == PipeState::Connected
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Pipe {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("name", &self.name.to_string())
            .field("role", &self.role)
            .field("state", &self.state())
            .finish()
    }
}

fn bind_listener(name: &PipeName) -> io::Result<OwnedFd> {
    let listener = sys::seqpacket_socket()?;
    sys::bind_and_listen(&listener, name)?;
    sys::set_nonblocking(&listener)?;
    Ok(listener)
}

fn check_name_len(name: &PipeName) -> Result<()> {
    let len = sys::address_len(name);
    let max = sys::max_address_len();
    if len > max {
        return Err(TransportError::NameTooLong {
            name: name.to_string(),
            len,
            max,
        });
    }
    Ok(())
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn is_server_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
    )
}

/// Socket file left by a filesystem-path server.
///
/// Removed on close only while it is still the inode this server created.
#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
struct SocketFile {
    path: std::path::PathBuf,
    dev: u64,
    ino: u64,
}

#[cfg(not(target_os = "linux"))]
impl SocketFile {
    fn capture(name: &PipeName) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;

        let path = name.socket_path();
        let metadata = std::fs::symlink_metadata(&path).ok()?;
        Some(Self {
            path,
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    fn remove(&self) {
        use std::os::unix::fs::{FileTypeExt, MetadataExt};

        match std::fs::symlink_metadata(&self.path) {
            Ok(metadata)
                if metadata.file_type().is_socket()
                    && metadata.dev() == self.dev
                    && metadata.ino() == self.ino =>
            {
                debug!(path = ?self.path, "removing socket file");
                let _ = std::fs::remove_file(&self.path);
            }
            Ok(_) => debug!(path = ?self.path, "socket path identity changed; skipping cleanup"),
            Err(_) => {}
        }
    }
}
