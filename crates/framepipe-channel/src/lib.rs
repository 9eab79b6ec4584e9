//! Host/client message channels.
//!
//! A channel pairs a [`Host`], which creates a named pipe under a random
//! identifier, with a [`Client`] in another process that connects to that
//! identifier. Each side owns a background receiver thread that hands every
//! well-sized frame to a [`Handler`]; frames of any other size are dropped.
//! Sends are best effort and can come from any thread.

pub mod config;
pub mod error;
pub mod handler;
pub mod sink;

#[cfg(unix)]
mod client;
#[cfg(unix)]
mod endpoint;
#[cfg(unix)]
mod host;
#[cfg(unix)]
mod receiver;

pub use config::{ChannelConfig, DEFAULT_SCRATCH_CAPACITY};
pub use error::{ChannelError, Result};
pub use handler::{decoded, Decoded, Handler};
pub use sink::{InputDispatcher, MessageSink};

#[cfg(unix)]
pub use client::Client;
#[cfg(unix)]
pub use host::Host;
