//! Fixed-size binary messages for framepipe channels.
//!
//! Every message is exactly [`MESSAGE_SIZE`] bytes:
//! - A 4-byte little-endian message code
//! - A 28-byte payload whose layout depends on the code, zero-padded
//!
//! The transport preserves message boundaries, so no length prefix is
//! needed. A buffer of any other size is not a message.

pub mod code;
pub mod codec;
pub mod error;
pub mod kinds;
pub mod message;

pub use code::{
    code_name, is_input, AXIS, BUFFER_COMMIT, FRAME_COMPLETE, INPUT_CODE_START, KEYBOARD,
    KNOWN_CODES, POINTER, QUIT, RAW_TOUCH, RESIZE, SET_SIZE_AND_STYLE, TOUCH,
};
pub use codec::{RawMessage, CODE_SIZE, MESSAGE_SIZE, PAYLOAD_SIZE};
pub use error::{FrameError, Result};
pub use kinds::{
    AxisEvent, BufferCommit, FrameComplete, KeyboardEvent, MessageKind, PointerEvent, Quit,
    RawTouchEvent, Resize, SetSizeAndStyle, TouchEvent, TouchPoint,
};
pub use message::Message;
