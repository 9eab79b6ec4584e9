//! Fixed-size message channels between two local processes.
//!
//! framepipe connects a UI-side host process with a rendering-side client
//! process over a named, message-framed local pipe. Every message is a
//! 32-byte frame; each side receives on its own background thread.
//!
//! # Crate Structure
//!
//! - [`transport`]: named pipe with cancellable blocking I/O
//! - [`frame`]: fixed-size message codes, layouts and decoding
//! - [`channel`]: `Host` / `Client` channels, handlers and input dispatch

/// Re-export transport types.
pub mod transport {
    pub use framepipe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use framepipe_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use framepipe_channel::*;
}

pub use framepipe_channel::{ChannelConfig, ChannelError, Handler, MessageSink};
#[cfg(unix)]
pub use framepipe_channel::{Client, Host};
pub use framepipe_frame::{Message, MESSAGE_SIZE};
