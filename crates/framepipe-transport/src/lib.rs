//! Named, message-framed local pipes.
//!
//! A [`Pipe`] connects exactly two processes: a server that creates the pipe
//! under an integer identifier, and a client that connects to the same
//! identifier. Every `send` is delivered as one whole `receive`, and every
//! blocking operation can be cancelled from another thread with
//! [`Pipe::close`].
//!
//! This is the lowest layer of framepipe. The framing and channel crates
//! build on the [`Pipe`] type provided here.

pub mod config;
pub mod error;
pub mod name;
pub mod state;

#[cfg(unix)]
pub mod pipe;
#[cfg(unix)]
mod sys;
#[cfg(unix)]
pub mod wake;

pub use config::{ConnectConfig, ListenConfig};
pub use error::{Result, TransportError};
pub use name::{random_identifier, PipeName, PIPE_NAME_PREFIX};
pub use state::{PendingOp, PipeState, Role};

#[cfg(unix)]
pub use pipe::Pipe;
#[cfg(unix)]
pub use wake::WakeSignal;
